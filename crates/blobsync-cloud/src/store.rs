//! [`ObjectProvider`] over the `object_store` crate
//!
//! `object_store` keys cannot end in `/`, so a directory marker `dir/` is
//! stored at key `dir` tagged with the directory content type and reported
//! back under its trailing-slash name. Listings only carry basic metadata,
//! so each listed entry costs one extra head request for its attributes.

use crate::error::{CloudError, Result};
use crate::runtime::get_runtime;
use blobsync_core::metadata::{decode_mtime, encode_mtime};
use blobsync_core::{
    Access, ObjectInfo, ObjectProvider, UploadRequest, UploadSource, DIRECTORY_CONTENT_TYPE,
    MTIME_METADATA_KEY,
};
use bytes::Bytes;
use chrono::Utc;
use futures_util::TryStreamExt;
use object_store::path::Path as StorePath;
use object_store::{
    Attribute, AttributeValue, Attributes, DynObjectStore, GetOptions, ObjectMeta, PutOptions,
    PutPayload,
};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

/// URI schemes a [`CloudStore`] can be created for
pub const SUPPORTED_SCHEMES: &[&str] = &["gs", "s3", "az", "azblob"];

/// Credentials and options used when building per-bucket stores
#[derive(Debug, Clone, Default)]
pub struct CloudConfig {
    /// Service account key file for `gs://`; the environment is used when unset
    pub service_account_path: Option<PathBuf>,
}

/// Object provider for one URI scheme, building a store per bucket on demand
pub struct CloudStore {
    scheme: String,
    config: CloudConfig,
    stores: Mutex<HashMap<String, Arc<DynObjectStore>>>,
    runtime: Arc<Runtime>,
}

impl fmt::Debug for CloudStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudStore")
            .field("scheme", &self.scheme)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CloudStore {
    /// Create a provider for `scheme`; bucket stores are built lazily
    pub fn new(scheme: &str, config: CloudConfig) -> Result<Self> {
        if !SUPPORTED_SCHEMES.contains(&scheme) {
            return Err(CloudError::UnsupportedScheme(format!(
                "{}. Use gs://, s3://, or az://",
                scheme
            )));
        }

        Ok(CloudStore {
            scheme: scheme.to_string(),
            config,
            stores: Mutex::new(HashMap::new()),
            runtime: get_runtime()?,
        })
    }

    /// Create a provider serving one bucket from an existing store (useful for testing)
    pub fn with_bucket_store(scheme: &str, bucket: &str, store: Arc<DynObjectStore>) -> Result<Self> {
        let cloud = Self::new(scheme, CloudConfig::default())?;
        cloud.cache()?.insert(bucket.to_string(), store);
        Ok(cloud)
    }

    /// The scheme this provider serves
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    fn cache(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Arc<DynObjectStore>>>> {
        self.stores
            .lock()
            .map_err(|_| CloudError::Runtime("store cache lock poisoned".to_string()))
    }

    fn store_for(&self, bucket: &str) -> Result<Arc<DynObjectStore>> {
        let mut stores = self.cache()?;
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        debug!("Creating {} store for bucket {}", self.scheme, bucket);
        let store = build_store(&self.scheme, bucket, &self.config)?;
        stores.insert(bucket.to_string(), store.clone());
        Ok(store)
    }

    fn list(&self, bucket: &str, prefix: &str, limit: Option<usize>) -> Result<Vec<ObjectInfo>> {
        let store = self.store_for(bucket)?;
        let limit = limit.unwrap_or(usize::MAX);

        // listing is per directory; a partial last segment filters the parent
        let dir = match prefix.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "",
        };
        let list_path = if dir.is_empty() {
            None
        } else {
            Some(store_key(dir)?)
        };

        self.runtime.block_on(async {
            let mut metas: Vec<ObjectMeta> = store.list(list_path.as_ref()).try_collect().await?;
            if prefix.ends_with('/') {
                if let Some((meta, _)) = head(store.as_ref(), &store_key(prefix)?).await? {
                    metas.push(meta);
                }
            }
            metas.sort_by(|a, b| a.location.as_ref().cmp(b.location.as_ref()));

            let mut objects = Vec::new();
            for meta in metas {
                if objects.len() >= limit {
                    break;
                }
                // the listed entry may vanish before its head request
                let Some((meta, attributes)) = head(store.as_ref(), &meta.location).await? else {
                    continue;
                };
                let object = object_info(bucket, &meta, &attributes);
                if object.name.starts_with(prefix) {
                    objects.push(object);
                }
            }
            objects.sort_by(|a, b| a.name.cmp(&b.name));
            Ok::<_, CloudError>(objects)
        })
    }
}

impl ObjectProvider for CloudStore {
    fn get_bucket(&self, bucket: &str) -> blobsync_core::Result<()> {
        self.store_for(bucket)?;
        Ok(())
    }

    fn get_object(&self, bucket: &str, name: &str) -> blobsync_core::Result<Option<ObjectInfo>> {
        let store = self.store_for(bucket)?;
        let key = store_key(name)?;
        let found = self.runtime.block_on(head(store.as_ref(), &key))?;

        // `dir` and `dir/` share a key; only an exact name matches
        Ok(found
            .map(|(meta, attributes)| object_info(bucket, &meta, &attributes))
            .filter(|object| object.name == name))
    }

    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        limit: Option<usize>,
    ) -> blobsync_core::Result<Vec<ObjectInfo>> {
        Ok(self.list(bucket, prefix, limit)?)
    }

    fn download(&self, object: &ObjectInfo, local_path: &Path) -> blobsync_core::Result<()> {
        let store = self.store_for(&object.bucket)?;
        let key = store_key(&object.name)?;

        let data = self.runtime.block_on(async {
            match store.get(&key).await {
                Ok(result) => result.bytes().await.map(Some),
                Err(object_store::Error::NotFound { .. }) => Ok(None),
                Err(e) => Err(e),
            }
        });
        let Some(data) = data.map_err(CloudError::from)? else {
            return Err(blobsync_core::Error::not_found(object.uri(&self.scheme), Access::Read));
        };

        std::fs::write(local_path, &data)?;
        Ok(())
    }

    fn upload(
        &self,
        bucket: &str,
        name: &str,
        source: UploadSource<'_>,
        request: &UploadRequest,
    ) -> blobsync_core::Result<ObjectInfo> {
        let store = self.store_for(bucket)?;
        let key = store_key(name)?;
        let data = match source {
            UploadSource::File(path) => Bytes::from(std::fs::read(path)?),
            UploadSource::Bytes(bytes) => Bytes::copy_from_slice(bytes),
        };
        let size = data.len() as u64;

        let content_type = if name.ends_with('/') {
            Some(DIRECTORY_CONTENT_TYPE.to_string())
        } else {
            request.content_type.clone()
        };
        let mut attributes = Attributes::new();
        if let Some(content_type) = &content_type {
            attributes.insert(Attribute::ContentType, AttributeValue::from(content_type.clone()));
        }
        if let Some(mtime) = request.logical_mtime {
            attributes.insert(
                Attribute::Metadata(MTIME_METADATA_KEY.into()),
                AttributeValue::from(encode_mtime(mtime)),
            );
        }

        let options = PutOptions {
            attributes,
            ..Default::default()
        };
        self.runtime
            .block_on(store.put_opts(&key, PutPayload::from(data), options))
            .map_err(CloudError::from)?;

        Ok(ObjectInfo {
            bucket: bucket.to_string(),
            name: name.to_string(),
            size,
            content_type,
            updated: Some(Utc::now()),
            custom_mtime: request.logical_mtime,
        })
    }

    fn delete(&self, object: &ObjectInfo) -> blobsync_core::Result<()> {
        let store = self.store_for(&object.bucket)?;
        let key = store_key(&object.name)?;

        match self.runtime.block_on(store.delete(&key)) {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(CloudError::from(e).into()),
        }
    }
}

#[allow(unused_variables)]
fn build_store(scheme: &str, bucket: &str, config: &CloudConfig) -> Result<Arc<DynObjectStore>> {
    match scheme {
        #[cfg(feature = "gcp")]
        "gs" => {
            let mut builder =
                object_store::gcp::GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
            if let Some(path) = &config.service_account_path {
                builder = builder.with_service_account_path(path.to_string_lossy());
            }
            Ok(Arc::new(builder.build()?))
        }
        #[cfg(feature = "aws")]
        "s3" => {
            let store = object_store::aws::AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .build()?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "azure")]
        "az" | "azblob" => {
            let store = object_store::azure::MicrosoftAzureBuilder::from_env()
                .with_container_name(bucket)
                .build()?;
            Ok(Arc::new(store))
        }
        other => Err(CloudError::UnsupportedScheme(format!(
            "{} (not enabled in this build)",
            other
        ))),
    }
}

/// Store key for an object name; markers drop their trailing `/`
fn store_key(name: &str) -> Result<StorePath> {
    let key = name.trim_end_matches('/');
    if key.is_empty() {
        return Err(CloudError::InvalidName(name.to_string()));
    }
    StorePath::parse(key).map_err(|e| CloudError::InvalidName(format!("{}: {}", name, e)))
}

async fn head(store: &DynObjectStore, key: &StorePath) -> Result<Option<(ObjectMeta, Attributes)>> {
    let options = GetOptions {
        head: true,
        ..Default::default()
    };
    match store.get_opts(key, options).await {
        Ok(result) => Ok(Some((result.meta, result.attributes))),
        Err(object_store::Error::NotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn attribute_str(value: &AttributeValue) -> &str {
    value.as_ref()
}

fn object_info(bucket: &str, meta: &ObjectMeta, attributes: &Attributes) -> ObjectInfo {
    let content_type = attributes
        .get(&Attribute::ContentType)
        .map(|value| attribute_str(value).to_string());
    let mut name = meta.location.to_string();
    if content_type.as_deref() == Some(DIRECTORY_CONTENT_TYPE) {
        name.push('/');
    }

    let raw_mtime = attributes.get(&Attribute::Metadata(MTIME_METADATA_KEY.into()));
    let custom_mtime = raw_mtime.and_then(|value| decode_mtime(attribute_str(value)));
    if let (Some(raw), None) = (raw_mtime, custom_mtime) {
        warn!("Ignoring unparseable mtime metadata {:?} on {}", attribute_str(raw), name);
    }

    ObjectInfo {
        bucket: bucket.to_string(),
        name,
        size: meta.size as u64,
        content_type,
        updated: Some(meta.last_modified),
        custom_mtime,
    }
}
