//! Testing utilities and fixtures for blobsync
//!
//! This crate provides an in-memory object provider, a standard remote tree
//! and helpers for local scratch directories.

use anyhow::Result;
use filetime::FileTime;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub mod assertions;
pub mod fixtures;
pub mod memory;

pub use fixtures::{create_remote_tree, jan_2021, remote_tree, test_uri, TEST_BUCKET};
pub use memory::{MemoryProvider, StoredObject};

/// Creates a temporary test directory with cleanup on drop
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    /// Creates a new temporary test directory
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Returns the path to the temporary directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Creates a file with the given name and content in the test directory
    pub fn create_file(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Creates a file and stamps it with a whole-second modification time
    pub fn create_file_with_mtime(&self, name: &str, content: &[u8], mtime: i64) -> Result<PathBuf> {
        let path = self.create_file(name, content)?;
        filetime::set_file_mtime(&path, FileTime::from_unix_time(mtime, 0))?;
        Ok(path)
    }

    /// Creates a directory with the given name in the test directory
    pub fn create_dir(&self, name: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(&path)?;
        Ok(path)
    }
}
