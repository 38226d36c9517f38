use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid object name: {0}")]
    InvalidName(String),

    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, CloudError>;

impl From<CloudError> for blobsync_core::Error {
    fn from(err: CloudError) -> Self {
        match err {
            CloudError::Io(io_err) => blobsync_core::Error::Io(io_err),
            other => blobsync_core::Error::provider(other),
        }
    }
}
