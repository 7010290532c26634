//! Storage setup and initialization

use anyhow::{Context, Result};
use scangate_core::Config;
use scangate_storage::{create_storage, Storage};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage abstraction...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;
    let backend_type = storage.backend_type();
    tracing::info!(
        backend = %backend_type,
        bucket = config.s3_bucket().unwrap_or_default(),
        "Storage abstraction initialized successfully"
    );

    Ok(storage)
}
