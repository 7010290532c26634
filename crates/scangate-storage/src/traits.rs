//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// HTTP metadata stored alongside an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Object metadata as returned by bucket listings. Never carries the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
    pub etag: Option<String>,
    pub uploaded: DateTime<Utc>,
    pub http_metadata: HttpMetadata,
}

impl ObjectMeta {
    pub fn content_type(&self) -> Option<&str> {
        self.http_metadata.content_type.as_deref()
    }
}

/// An object body together with its metadata.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub meta: ObjectMeta,
    pub data: Bytes,
}

/// Storage abstraction trait
///
/// The gateway treats the bucket as a flat key/value store: list everything,
/// read one object, overwrite one object. Writes to the same key are last
/// write wins. There is no delete.
#[async_trait]
pub trait Storage: Send + Sync {
    /// List metadata for every stored object, ordered by key.
    async fn list(&self) -> StorageResult<Vec<ObjectMeta>>;

    /// Read an object. Returns `StorageError::NotFound` when the key is absent.
    async fn get(&self, key: &str) -> StorageResult<StoredObject>;

    /// Write an object, replacing any previous value under the same key.
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<ObjectMeta>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
