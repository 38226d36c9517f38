//! # blobsync-cloud
//!
//! Object storage provider for blobsync. [`CloudStore`] implements the
//! synchronous [`blobsync_core::ObjectProvider`] trait over the async
//! `object_store` crate, so the sync engine can run against Google Cloud
//! Storage (and, with the matching features, S3 or Azure) without dealing
//! with async code.
//!
//! The adapter uses an internal Tokio runtime to bridge the async API;
//! its methods must not be called from inside another Tokio runtime.

#![warn(missing_debug_implementations)]

mod error;
mod runtime;
mod store;

pub use error::{CloudError, Result};
pub use store::{CloudConfig, CloudStore, SUPPORTED_SCHEMES};

// Re-export commonly used types from object_store
pub use object_store::{memory::InMemory, DynObjectStore, ObjectStore};
