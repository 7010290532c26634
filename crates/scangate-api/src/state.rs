//! Application state shared by all handlers.
//!
//! Everything here is read-only after startup; requests never mutate shared state.

use crate::services::upload::UploadService;
use scangate_core::Config;
use scangate_services::ScannerService;
use scangate_storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub scanner: ScannerService,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn Storage>, scanner: ScannerService) -> Self {
        Self {
            config,
            storage,
            scanner,
        }
    }

    pub fn upload_service(&self) -> UploadService {
        UploadService::new(self.scanner.clone(), self.storage.clone())
    }
}
