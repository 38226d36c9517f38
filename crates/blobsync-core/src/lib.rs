//! Blobsync - mtime-aware mirroring between local paths and object storage
//!
//! Object stores have no native modification time: re-uploading identical
//! bytes resets the provider's timestamp. This library stores a logical mtime
//! as custom object metadata and uses it to decide, without hashing content,
//! whether a local copy is stale.
//!
//! The engine is made of free functions over an [`ObjectProvider`]:
//! - [`classify`] tells buckets, directories, files and absent paths apart
//! - [`download_file`] / [`download_dir`] skip objects whose local copy is current
//! - [`upload_file`] / [`upload_dir`] record the local mtime remotely
//! - [`aggregate_mtime`] summarizes a tree down to a bounded depth
//! - [`exists_as`] / [`clear`] cover existence checks and idempotent deletion
//!
//! [`Localizer`] wraps these into hooks for a pipeline framework, with a
//! per-run [`RunContext`] remembering which staged outputs go where.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod localize;
pub mod metadata;
pub mod provider;
pub mod registry;
pub mod transfer;
pub mod uri;

pub use error::{Access, Error, Result};

// Re-export commonly used types
pub use aggregate::aggregate_mtime;
pub use classify::{classify, EntryKind, ObjectKind};
pub use config::Config;
pub use lifecycle::{clear, exists_as};
pub use localize::{JobOutput, Localizer, ResolvedPath};
pub use metadata::{logical_mtime, set_logical_mtime, DIRECTORY_CONTENT_TYPE, MTIME_METADATA_KEY};
pub use provider::{ObjectInfo, ObjectProvider, UploadRequest, UploadSource};
pub use registry::{MappingRegistry, RunContext};
pub use transfer::{
    create_dir_marker, download_dir, download_file, upload_dir, upload_file, TransferOutcome,
    TransferSummary,
};
pub use uri::{is_remote_uri, ObjectUri};
