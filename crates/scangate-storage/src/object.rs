use crate::keys::validate_key;
use crate::traits::{HttpMetadata, ObjectMeta, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::{StreamExt, TryStreamExt};
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, ObjectStore, PutOptions, PutPayload,
};
use std::sync::Arc;

#[cfg(feature = "storage-s3")]
use object_store::aws::AmazonS3Builder;

/// Listing reads attributes with one HEAD per object; cap how many run at once.
const LIST_HEAD_CONCURRENCY: usize = 16;

/// Bucket storage backed by an `object_store` implementation.
///
/// The content type is kept in the object's `Content-Type` attribute, which
/// S3/R2 map to the HTTP header and `InMemory` keeps alongside the bytes.
#[derive(Clone)]
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    backend: StorageBackend,
}

impl ObjectStorage {
    /// Create an S3-compatible backend.
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `region` - AWS region (`auto` for R2)
    /// * `endpoint_url` - Optional custom endpoint for S3-compatible providers
    ///   (e.g. `https://<account>.r2.cloudflarestorage.com`, or `http://localhost:9000` for MinIO)
    #[cfg(feature = "storage-s3")]
    pub fn s3(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(ObjectStorage {
            store: Arc::new(store),
            bucket,
            backend: StorageBackend::S3,
        })
    }

    /// Create a process-local backend. Contents are lost on restart.
    pub fn in_memory() -> Self {
        ObjectStorage {
            store: Arc::new(InMemory::new()),
            bucket: "memory".to_string(),
            backend: StorageBackend::Memory,
        }
    }

    fn location(key: &str) -> StorageResult<Path> {
        validate_key(key)?;
        Path::parse(key).map_err(|e| StorageError::InvalidKey(e.to_string()))
    }

    async fn head_content_type(&self, location: &Path) -> StorageResult<Option<String>> {
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        match self.store.get_opts(location, options).await {
            Ok(result) => Ok(content_type_of(&result.attributes)),
            // Removed between listing and head; report it without a type.
            Err(ObjectStoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(StorageError::ListFailed(e.to_string())),
        }
    }
}

fn content_type_of(attributes: &Attributes) -> Option<String> {
    attributes
        .get(&Attribute::ContentType)
        .map(|value| value.to_string())
}

fn normalize_etag(etag: Option<String>) -> Option<String> {
    etag.map(|tag| tag.trim_matches('"').to_string())
}

#[async_trait]
impl Storage for ObjectStorage {
    async fn list(&self) -> StorageResult<Vec<ObjectMeta>> {
        let start = std::time::Instant::now();

        let listed: Vec<object_store::ObjectMeta> = self
            .store
            .list(None)
            .try_collect()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object store list failed"
                );
                StorageError::ListFailed(e.to_string())
            })?;

        let mut objects: Vec<ObjectMeta> = futures::stream::iter(listed)
            .map(|meta| async move {
                let content_type = self.head_content_type(&meta.location).await?;
                Ok::<_, StorageError>(ObjectMeta {
                    key: meta.location.to_string(),
                    size: meta.size,
                    etag: normalize_etag(meta.e_tag),
                    uploaded: meta.last_modified,
                    http_metadata: HttpMetadata { content_type },
                })
            })
            .buffer_unordered(LIST_HEAD_CONCURRENCY)
            .try_collect()
            .await?;

        objects.sort_by(|a, b| a.key.cmp(&b.key));

        tracing::info!(
            bucket = %self.bucket,
            object_count = objects.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object store list successful"
        );

        Ok(objects)
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        let start = std::time::Instant::now();
        let location = Self::location(key)?;

        let result = self
            .store
            .get_opts(&location, GetOptions::default())
            .await
            .map_err(|e| match e {
                ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
                other => {
                    tracing::error!(
                        error = %other,
                        bucket = %self.bucket,
                        key = %key,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "Object store download failed"
                    );
                    StorageError::DownloadFailed(other.to_string())
                }
            })?;

        let content_type = content_type_of(&result.attributes);
        let meta = ObjectMeta {
            key: key.to_string(),
            size: result.meta.size,
            etag: normalize_etag(result.meta.e_tag.clone()),
            uploaded: result.meta.last_modified,
            http_metadata: HttpMetadata { content_type },
        };

        let data = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object store download successful"
        );

        Ok(StoredObject { meta, data })
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<ObjectMeta> {
        let start = std::time::Instant::now();
        let location = Self::location(key)?;
        let size = data.len() as u64;

        let mut attributes = Attributes::new();
        if let Some(content_type) = content_type {
            attributes.insert(
                Attribute::ContentType,
                AttributeValue::from(content_type.to_string()),
            );
        }
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result = self
            .store
            .put_opts(&location, PutPayload::from(data), options)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object store upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object store upload successful"
        );

        Ok(ObjectMeta {
            key: key.to_string(),
            size,
            etag: normalize_etag(result.e_tag),
            uploaded: Utc::now(),
            http_metadata: HttpMetadata {
                content_type: content_type.map(String::from),
            },
        })
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}
