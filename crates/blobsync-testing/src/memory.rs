//! In-memory object provider with call counters
//!
//! Object names are kept verbatim, so directory markers ending in `/` behave
//! as they do on a real bucket. Counters make "no bytes were fetched"
//! observable in tests.

use blobsync_core::{Access, Error, ObjectInfo, ObjectProvider, Result, UploadRequest, UploadSource};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Object as held by [`MemoryProvider`]
#[derive(Debug, Clone, Default)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
    pub updated: Option<DateTime<Utc>>,
    pub custom_mtime: Option<f64>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, BTreeMap<String, StoredObject>>,
    downloads: usize,
    uploads: usize,
    deletes: usize,
    lists: usize,
    deleted: Vec<String>,
}

/// A provider backed by ordered in-memory maps
#[derive(Debug, Default)]
pub struct MemoryProvider {
    state: Mutex<State>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider with one empty bucket
    pub fn with_bucket(bucket: &str) -> Self {
        let provider = Self::new();
        provider.create_bucket(bucket);
        provider
    }

    pub fn create_bucket(&self, bucket: &str) {
        self.lock().buckets.entry(bucket.to_string()).or_default();
    }

    /// Insert an object directly, bypassing counters
    pub fn insert(&self, bucket: &str, name: &str, object: StoredObject) {
        self.lock()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(name.to_string(), object);
    }

    /// Insert a file object with an optional logical mtime
    pub fn put(&self, bucket: &str, name: &str, data: &[u8], mtime: Option<f64>) {
        self.insert(
            bucket,
            name,
            StoredObject {
                data: data.to_vec(),
                content_type: None,
                updated: Some(Utc::now()),
                custom_mtime: mtime,
            },
        );
    }

    /// Insert a zero-byte directory marker; `name` must end in `/`
    pub fn put_marker(&self, bucket: &str, name: &str, mtime: Option<f64>) {
        self.insert(
            bucket,
            name,
            StoredObject {
                data: Vec::new(),
                content_type: Some(blobsync_core::DIRECTORY_CONTENT_TYPE.to_string()),
                updated: Some(Utc::now()),
                custom_mtime: mtime,
            },
        );
    }

    /// Remove an object behind the engine's back
    pub fn remove(&self, bucket: &str, name: &str) -> Option<StoredObject> {
        self.lock().buckets.get_mut(bucket)?.remove(name)
    }

    pub fn object(&self, bucket: &str, name: &str) -> Option<StoredObject> {
        self.lock().buckets.get(bucket)?.get(name).cloned()
    }

    /// All object names in a bucket, in lexical order
    pub fn names(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn download_count(&self) -> usize {
        self.lock().downloads
    }

    pub fn upload_count(&self) -> usize {
        self.lock().uploads
    }

    pub fn delete_count(&self) -> usize {
        self.lock().deletes
    }

    pub fn list_count(&self) -> usize {
        self.lock().lists
    }

    /// Names of deleted objects, in the order they were removed
    pub fn deleted_names(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    pub fn reset_counters(&self) {
        let mut state = self.lock();
        state.downloads = 0;
        state.uploads = 0;
        state.deletes = 0;
        state.lists = 0;
        state.deleted.clear();
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn info(bucket: &str, name: &str, object: &StoredObject) -> ObjectInfo {
    ObjectInfo {
        bucket: bucket.to_string(),
        name: name.to_string(),
        size: object.data.len() as u64,
        content_type: object.content_type.clone(),
        updated: object.updated,
        custom_mtime: object.custom_mtime,
    }
}

fn missing_bucket(bucket: &str) -> Error {
    Error::provider(format!("bucket does not exist: {bucket}"))
}

impl ObjectProvider for MemoryProvider {
    fn get_bucket(&self, bucket: &str) -> Result<()> {
        if self.lock().buckets.contains_key(bucket) {
            Ok(())
        } else {
            Err(missing_bucket(bucket))
        }
    }

    fn get_object(&self, bucket: &str, name: &str) -> Result<Option<ObjectInfo>> {
        let state = self.lock();
        let objects = state.buckets.get(bucket).ok_or_else(|| missing_bucket(bucket))?;
        Ok(objects.get(name).map(|object| info(bucket, name, object)))
    }

    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ObjectInfo>> {
        let mut state = self.lock();
        state.lists += 1;
        let objects = state.buckets.get(bucket).ok_or_else(|| missing_bucket(bucket))?;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(name, object)| info(bucket, name, object))
            .collect())
    }

    fn download(&self, object: &ObjectInfo, local_path: &Path) -> Result<()> {
        let data = {
            let mut state = self.lock();
            let data = state
                .buckets
                .get(&object.bucket)
                .and_then(|objects| objects.get(&object.name))
                .map(|stored| stored.data.clone())
                .ok_or_else(|| {
                    Error::not_found(format!("mem://{}/{}", object.bucket, object.name), Access::Read)
                })?;
            state.downloads += 1;
            data
        };
        std::fs::write(local_path, data)?;
        Ok(())
    }

    fn upload(
        &self,
        bucket: &str,
        name: &str,
        source: UploadSource<'_>,
        request: &UploadRequest,
    ) -> Result<ObjectInfo> {
        let data = match source {
            UploadSource::File(path) => std::fs::read(path)?,
            UploadSource::Bytes(bytes) => bytes.to_vec(),
        };
        let stored = StoredObject {
            data,
            content_type: request.content_type.clone(),
            updated: Some(Utc::now()),
            custom_mtime: request.logical_mtime,
        };

        let mut state = self.lock();
        let objects = state.buckets.get_mut(bucket).ok_or_else(|| missing_bucket(bucket))?;
        let object = info(bucket, name, &stored);
        objects.insert(name.to_string(), stored);
        state.uploads += 1;
        Ok(object)
    }

    fn delete(&self, object: &ObjectInfo) -> Result<()> {
        let mut state = self.lock();
        let removed = state
            .buckets
            .get_mut(&object.bucket)
            .and_then(|objects| objects.remove(&object.name))
            .is_some();
        if removed {
            state.deletes += 1;
            state.deleted.push(object.name.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_is_prefix_bounded_and_ordered() {
        let provider = MemoryProvider::with_bucket("b");
        provider.put("b", "dir/b.txt", b"b", None);
        provider.put("b", "dir/a.txt", b"a", None);
        provider.put("b", "dirx/c.txt", b"c", None);
        provider.put("b", "other.txt", b"o", None);

        let names: Vec<_> = provider
            .list_objects("b", "dir/", None)
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["dir/a.txt", "dir/b.txt"]);

        assert_eq!(provider.list_objects("b", "dir/", Some(1)).unwrap().len(), 1);
        assert_eq!(provider.list_objects("b", "", None).unwrap().len(), 4);
    }

    #[test]
    fn test_unknown_bucket() {
        let provider = MemoryProvider::new();
        assert!(matches!(provider.get_bucket("nope"), Err(Error::Provider(_))));
        assert!(provider.get_object("nope", "x").is_err());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let provider = MemoryProvider::with_bucket("b");
        provider.put("b", "x", b"x", None);
        let object = provider.get_object("b", "x").unwrap().unwrap();

        provider.delete(&object).unwrap();
        provider.delete(&object).unwrap();
        assert_eq!(provider.delete_count(), 1);
        assert_eq!(provider.deleted_names(), vec!["x"]);
        assert!(provider.names("b").is_empty());
    }
}
