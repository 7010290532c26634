//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! so tests can build the same router around their own state.

pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use scangate_core::Config;
use scangate_services::ScannerService;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    // Setup storage
    let storage = storage::setup_storage(&config).await?;

    // Scan endpoint client
    let scanner =
        ScannerService::from_config(&config).context("Failed to initialize scan client")?;
    tracing::info!(
        scanner_url = %scanner.scanner_url(),
        timeout_secs = config.scanner_timeout().map(|t| t.as_secs()),
        "Scan client initialized"
    );

    let state = Arc::new(AppState::new(config.clone(), storage, scanner));

    // Setup routes
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
