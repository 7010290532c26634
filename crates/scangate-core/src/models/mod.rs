//! Domain models
//!
//! All models here are ephemeral: they live for the duration of one upload
//! request and are never persisted on their own.

pub mod scan;
pub mod upload;

pub use scan::{FileResult, FileScanResult, OverallStatus, ScanOutcome, UploadResultSet};
pub use upload::{UploadEntry, UploadedFile};
