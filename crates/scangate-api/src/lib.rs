//! Scangate API Library
//!
//! This crate provides the HTTP handlers, the upload orchestrator, and
//! application setup for the scanning upload gateway.

// Module declarations
mod handlers;
mod utils;

// Public modules
pub mod error;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;

// Re-exports
pub use error::HttpAppError;
pub use services::upload::UploadService;
pub use state::AppState;
