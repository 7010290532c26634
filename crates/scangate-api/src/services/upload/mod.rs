//! Upload orchestration: scan every file, persist the batch when a verdict
//! calls for it, and reduce the per-file results into the response body.

mod service;

pub use service::UploadService;
