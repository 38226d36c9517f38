//! Tokio runtime management for synchronous operations

use crate::error::{CloudError, Result};
use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;

/// Get or create a shared Tokio runtime for blocking operations
pub(crate) fn get_runtime() -> Result<Arc<Runtime>> {
    static RUNTIME: OnceLock<std::result::Result<Arc<Runtime>, String>> = OnceLock::new();

    RUNTIME
        .get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .thread_name("blobsync-cloud-worker")
                .build()
                .map(Arc::new)
                .map_err(|e| format!("Failed to create Tokio runtime: {}", e))
        })
        .clone()
        .map_err(CloudError::Runtime)
}
