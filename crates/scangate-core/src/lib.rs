//! Scangate Core Library
//!
//! This crate provides configuration, error types, and the domain models
//! (uploaded files, scan outcomes, upload result sets) shared across all
//! Scangate components.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, GatewayConfig, LogFormat};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    FileResult, FileScanResult, OverallStatus, ScanOutcome, UploadEntry, UploadResultSet,
    UploadedFile,
};
pub use storage_types::StorageBackend;
// Note: Storage, StorageError, StorageResult live in the scangate-storage crate
