//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p scangate-api`. The scan endpoint is
//! a mockito server; storage is the in-memory backend.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use scangate_api::setup::routes;
use scangate_api::state::AppState;
use scangate_core::{BaseConfig, Config, GatewayConfig, LogFormat, StorageBackend};
use scangate_services::ScannerService;
use scangate_storage::{ObjectStorage, Storage};
use std::sync::Arc;

/// Test application: server plus the pieces tests inspect directly.
pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<dyn Storage>,
    pub scanner: mockito::ServerGuard,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Keys currently in the bucket, sorted.
    pub async fn stored_keys(&self) -> Vec<String> {
        self.storage
            .list()
            .await
            .expect("Failed to list storage")
            .into_iter()
            .map(|meta| meta.key)
            .collect()
    }
}

pub fn test_config(scanner_url: String) -> Config {
    Config(Box::new(GatewayConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            environment: "test".to_string(),
            log_format: LogFormat::Compact,
        },
        scanner_url,
        scanner_user_agent: "MUS Forwarder".to_string(),
        scanner_timeout_secs: None,
        storage_backend: StorageBackend::Memory,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: None,
    }))
}

/// Setup test app with a mock scan endpoint at `/upload` and in-memory storage.
pub async fn setup_test_app() -> TestApp {
    let scanner = mockito::Server::new_async().await;
    let scanner_url = format!("{}/upload", scanner.url());
    build_test_app(scanner, scanner_url)
}

/// Setup test app whose scan endpoint is `scanner_url` instead of the mock.
pub async fn setup_test_app_with_scanner_url(scanner_url: &str) -> TestApp {
    let scanner = mockito::Server::new_async().await;
    build_test_app(scanner, scanner_url.to_string())
}

fn build_test_app(scanner: mockito::ServerGuard, scanner_url: String) -> TestApp {
    let config = test_config(scanner_url);
    let storage: Arc<dyn Storage> = Arc::new(ObjectStorage::in_memory());
    let scan_client =
        ScannerService::from_config(&config).expect("Failed to create scan client");

    let state = Arc::new(AppState::new(config.clone(), storage.clone(), scan_client));
    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        storage,
        scanner,
    }
}

/// Multipart form with one `file` part per `(name, contents)` pair.
pub fn upload_form(files: &[(&str, &str)]) -> MultipartForm {
    files
        .iter()
        .fold(MultipartForm::new(), |form, (name, contents)| {
            let part = Part::bytes(contents.as_bytes().to_vec())
                .file_name(*name)
                .mime_type("application/octet-stream");
            form.add_part("file", part)
        })
}
