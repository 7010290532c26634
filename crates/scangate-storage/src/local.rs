use crate::keys::validate_key;
use crate::traits::{HttpMetadata, ObjectMeta, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Sidecar directory under the base path holding each object's content type.
const META_DIR: &str = ".meta";

/// Staging directory for in-flight writes. Same filesystem as the objects,
/// so a finished write is moved into place with a rename.
const STAGING_DIR: &str = ".staging";

const RESERVED_DIRS: [&str; 2] = [META_DIR, STAGING_DIR];

/// Number of lock stripes guarding the object/sidecar pair of a key.
const KEY_LOCK_STRIPES: usize = 64;

/// Local filesystem storage implementation
///
/// Each put stages the body and the content type, then commits both under the
/// key's lock stripe. Readers take the same stripe, so an object is never
/// observed with another writer's content type.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    key_locks: Arc<Vec<RwLock<()>>>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/scangate/bucket")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        for dir in RESERVED_DIRS {
            fs::create_dir_all(base_path.join(dir))
                .await
                .map_err(|e| {
                    StorageError::ConfigError(format!(
                        "Failed to create storage directory {}: {}",
                        base_path.display(),
                        e
                    ))
                })?;
        }

        let key_locks = (0..KEY_LOCK_STRIPES).map(|_| RwLock::new(())).collect();

        Ok(LocalStorage {
            base_path,
            key_locks: Arc::new(key_locks),
        })
    }

    /// Convert a storage key to a filesystem path.
    ///
    /// Keys are validated first, and the sidecar and staging directories are
    /// not addressable.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;

        let top = key.split('/').next().unwrap_or_default();
        if RESERVED_DIRS.contains(&top) {
            return Err(StorageError::InvalidKey(format!(
                "Storage key uses a reserved prefix: {}",
                key
            )));
        }

        Ok(self.base_path.join(key))
    }

    fn key_lock(&self, key: &str) -> &RwLock<()> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.key_locks[(hasher.finish() as usize) % self.key_locks.len()]
    }

    fn staging_path(&self) -> PathBuf {
        self.base_path
            .join(STAGING_DIR)
            .join(Uuid::new_v4().to_string())
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.base_path.join(META_DIR).join(key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn read_content_type(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.meta_path(key))
            .await
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    async fn object_meta(&self, key: &str, path: &Path) -> StorageResult<ObjectMeta> {
        let metadata = fs::metadata(path).await?;
        let modified = metadata.modified()?;
        let uploaded: DateTime<Utc> = modified.into();
        let nanos = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        Ok(ObjectMeta {
            key: key.to_string(),
            size: metadata.len(),
            etag: Some(format!("{:x}-{:x}", nanos, metadata.len())),
            uploaded,
            http_metadata: HttpMetadata {
                content_type: self.read_content_type(key).await,
            },
        })
    }

    /// Collect object keys under the base path, skipping the sidecar directory.
    async fn collect_keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pending = vec![(self.base_path.clone(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                if prefix.is_empty() && RESERVED_DIRS.contains(&name.as_str()) {
                    continue;
                }

                let key = if prefix.is_empty() {
                    name
                } else {
                    format!("{}/{}", prefix, name)
                };

                if entry.file_type().await?.is_dir() {
                    pending.push((entry.path(), key));
                } else {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn write_file(path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        Ok(())
    }

    /// Write `data` to a fresh staging file and return its path.
    async fn stage(&self, data: &[u8]) -> StorageResult<PathBuf> {
        let staged = self.staging_path();
        if let Err(e) = Self::write_file(&staged, data).await {
            let _ = fs::remove_file(&staged).await;
            return Err(e);
        }
        Ok(staged)
    }

    async fn commit(staged: &Path, path: &Path) -> StorageResult<()> {
        fs::rename(staged, path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to move file into {}: {}", path.display(), e))
        })
    }

    /// Move a staged body and sidecar into place. Callers hold the key's write lock.
    async fn commit_object(
        &self,
        key: &str,
        path: &Path,
        meta_path: &Path,
        staged_data: &Path,
        staged_meta: Option<&Path>,
    ) -> StorageResult<ObjectMeta> {
        Self::commit(staged_data, path).await?;
        match staged_meta {
            Some(staged) => Self::commit(staged, meta_path).await?,
            None => match fs::remove_file(meta_path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::IoError(e)),
            },
        }
        self.object_meta(key, path).await
    }

    async fn discard(staged: &[&PathBuf]) {
        for path in staged {
            let _ = fs::remove_file(path).await;
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn list(&self) -> StorageResult<Vec<ObjectMeta>> {
        let start = std::time::Instant::now();
        let keys = self
            .collect_keys()
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?;

        let mut objects = Vec::with_capacity(keys.len());
        for key in keys {
            let path = self.base_path.join(&key);
            let _guard = self.key_lock(&key).read().await;
            match self.object_meta(&key, &path).await {
                Ok(meta) => objects.push(meta),
                // Replaced or removed while listing.
                Err(StorageError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::ListFailed(e.to_string())),
            }
        }

        tracing::info!(
            path = %self.base_path.display(),
            object_count = objects.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage list successful"
        );

        Ok(objects)
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        let (data, meta) = {
            let _guard = self.key_lock(key).read().await;

            match fs::metadata(&path).await {
                Ok(metadata) if metadata.is_file() => {}
                _ => return Err(StorageError::NotFound(key.to_string())),
            }

            let data = fs::read(&path).await.map_err(|e| {
                StorageError::DownloadFailed(format!(
                    "Failed to read file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            (data, self.object_meta(key, &path).await?)
        };

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(StoredObject {
            meta,
            data: Bytes::from(data),
        })
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<ObjectMeta> {
        let path = self.key_to_path(key)?;
        let meta_path = self.meta_path(key);
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;
        self.ensure_parent_dir(&meta_path).await?;

        let staged_data = self.stage(&data).await?;
        let staged_meta = match content_type {
            Some(content_type) => match self.stage(content_type.as_bytes()).await {
                Ok(staged) => Some(staged),
                Err(e) => {
                    Self::discard(&[&staged_data]).await;
                    return Err(e);
                }
            },
            None => None,
        };

        let committed = {
            let _guard = self.key_lock(key).write().await;
            self.commit_object(key, &path, &meta_path, &staged_data, staged_meta.as_deref())
                .await
        };

        let meta = match committed {
            Ok(meta) => meta,
            Err(e) => {
                let leftovers: Vec<&PathBuf> =
                    std::iter::once(&staged_data).chain(staged_meta.iter()).collect();
                Self::discard(&leftovers).await;
                return Err(e);
            }
        };

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(meta)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
