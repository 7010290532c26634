//! Scangate Storage Library
//!
//! This crate provides the bucket abstraction used by the gateway: the
//! `Storage` trait and its backends (S3/R2 and in-memory through
//! `object_store`, plus a local filesystem backend).
//!
//! # Storage key format
//!
//! Keys are used verbatim as object names. Uploaded files are stored under
//! their original file name and passthrough writes under the request path.
//! Keys must not be empty, start with `/`, or contain `.` / `..` or empty
//! segments. Validation is centralized in the `keys` module so all backends
//! accept the same keys.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod object;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use object::ObjectStorage;
pub use scangate_core::StorageBackend;
pub use traits::{HttpMetadata, ObjectMeta, Storage, StorageError, StorageResult, StoredObject};
