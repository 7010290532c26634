//! Scangate Services Layer
//!
//! Outbound integrations used by the upload path. Today that is the scan
//! client, which forwards one file to the malware-scanning endpoint and
//! classifies its answer. HTTP handling stays in scangate-api.

pub mod services;

pub use services::scanner::{ScanVerdict, ScannerService};
