//! The storage capability the engine is built on
//!
//! Swapping object stores only requires another [`ObjectProvider`]
//! implementation; the engine never talks to an SDK directly.

use crate::error::Result;
use crate::uri::{is_marker_name, ObjectUri};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Information about a remote object from a get or list call
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    /// Bucket holding the object
    pub bucket: String,
    /// Full object name within the bucket
    pub name: String,
    /// Object size in bytes
    pub size: u64,
    /// Content type, if the provider reports one
    pub content_type: Option<String>,
    /// Provider's own last-updated timestamp
    pub updated: Option<DateTime<Utc>>,
    /// Logical modification time decoded from custom metadata
    pub custom_mtime: Option<f64>,
}

impl ObjectInfo {
    /// True when this object is a directory marker
    pub fn is_marker(&self) -> bool {
        is_marker_name(&self.name)
    }

    /// The URI of this object under the given scheme
    pub fn uri(&self, scheme: &str) -> ObjectUri {
        ObjectUri::new(scheme, self.bucket.as_str(), self.name.as_str())
    }
}

/// Where the bytes of an upload come from
#[derive(Debug, Clone, Copy)]
pub enum UploadSource<'a> {
    /// Stream the contents of a local file
    File(&'a Path),
    /// Upload an in-memory buffer
    Bytes(&'a [u8]),
}

/// Metadata written alongside an upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadRequest {
    /// Content type to tag the object with
    pub content_type: Option<String>,
    /// Logical modification time to store as custom metadata
    pub logical_mtime: Option<f64>,
}

impl UploadRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Low-level object store operations, implemented per provider
///
/// Implementations are synchronous. Adapters over async SDKs bridge through
/// their own runtime.
pub trait ObjectProvider: Send + Sync {
    /// Validate that a bucket is reachable
    fn get_bucket(&self, _bucket: &str) -> Result<()> {
        Ok(())
    }

    /// Fetch an object by exact name, `None` if it does not exist
    fn get_object(&self, bucket: &str, name: &str) -> Result<Option<ObjectInfo>>;

    /// List objects whose name starts with `prefix`, in lexical order
    fn list_objects(&self, bucket: &str, prefix: &str, limit: Option<usize>)
        -> Result<Vec<ObjectInfo>>;

    /// Download an object's bytes to a local file
    ///
    /// Parent directories are created by the caller.
    fn download(&self, object: &ObjectInfo, local_path: &Path) -> Result<()>;

    /// Upload bytes as `name`, tagging the object per `request`
    fn upload(
        &self,
        bucket: &str,
        name: &str,
        source: UploadSource<'_>,
        request: &UploadRequest,
    ) -> Result<ObjectInfo>;

    /// Delete an object; deleting something already gone is not an error
    fn delete(&self, object: &ObjectInfo) -> Result<()>;
}

impl<P: ObjectProvider + ?Sized> ObjectProvider for std::sync::Arc<P> {
    fn get_bucket(&self, bucket: &str) -> Result<()> {
        (**self).get_bucket(bucket)
    }

    fn get_object(&self, bucket: &str, name: &str) -> Result<Option<ObjectInfo>> {
        (**self).get_object(bucket, name)
    }

    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ObjectInfo>> {
        (**self).list_objects(bucket, prefix, limit)
    }

    fn download(&self, object: &ObjectInfo, local_path: &Path) -> Result<()> {
        (**self).download(object, local_path)
    }

    fn upload(
        &self,
        bucket: &str,
        name: &str,
        source: UploadSource<'_>,
        request: &UploadRequest,
    ) -> Result<ObjectInfo> {
        (**self).upload(bucket, name, source, request)
    }

    fn delete(&self, object: &ObjectInfo) -> Result<()> {
        (**self).delete(object)
    }
}
