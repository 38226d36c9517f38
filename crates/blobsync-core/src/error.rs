//! Error types for blobsync-core

use std::fmt;
use thiserror::Error;

/// Boxed error surfaced by an object storage provider
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The kind of access that was being attempted when an error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Reading or downloading from the remote store
    Read,
    /// Writing or uploading to the remote store
    Write,
    /// Deleting from the remote store
    Delete,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => f.write_str("read"),
            Access::Write => f.write_str("write"),
            Access::Delete => f.write_str("delete"),
        }
    }
}

/// Core error types for the sync engine
#[derive(Error, Debug)]
pub enum Error {
    /// URI is malformed or names a bucket where an object was required
    #[error("Invalid URI for {access}: {uri} ({reason})")]
    InvalidUri {
        uri: String,
        access: Access,
        reason: String,
    },

    /// A required remote object does not exist
    #[error("Object not found for {access}: {uri}")]
    ObjectNotFound { uri: String, access: Access },

    /// Failure reported by the storage provider, propagated as-is
    #[error("Provider error: {0}")]
    Provider(#[source] BoxError),

    /// Local I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for an `InvalidUri` error
    pub fn invalid_uri(uri: impl fmt::Display, access: Access, reason: impl Into<String>) -> Self {
        Error::InvalidUri {
            uri: uri.to_string(),
            access,
            reason: reason.into(),
        }
    }

    /// Shorthand for an `ObjectNotFound` error
    pub fn not_found(uri: impl fmt::Display, access: Access) -> Self {
        Error::ObjectNotFound {
            uri: uri.to_string(),
            access,
        }
    }

    /// Wrap any provider failure
    pub fn provider<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Provider(err.into())
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::Io(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
