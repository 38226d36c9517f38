//! Common assertions for blobsync testing

use anyhow::{Context, Result};
use blobsync_core::metadata::{is_current, local_mtime};
use std::path::Path;

/// Asserts that a local file holds exactly `expected`
pub fn assert_file_content(path: &Path, expected: &[u8]) -> Result<()> {
    let content = std::fs::read(path).with_context(|| format!("reading {:?}", path))?;
    assert_eq!(
        content,
        expected,
        "Content mismatch for {:?}: {:?}",
        path,
        String::from_utf8_lossy(&content)
    );
    Ok(())
}

/// Asserts that a local path carries the given modification time
pub fn assert_mtime(path: &Path, expected: f64) -> Result<()> {
    let mtime = local_mtime(path)?.with_context(|| format!("{:?} does not exist", path))?;
    assert!(
        is_current(mtime, expected) && is_current(expected, mtime),
        "Mtime mismatch for {:?}: {} != {}",
        path,
        mtime,
        expected
    );
    Ok(())
}
