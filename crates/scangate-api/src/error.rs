//! HTTP error response conversion
//!
//! This module provides HTTP-specific error response conversion for AppError.
//!
//! **Preferred handler pattern:** Return `Result<impl IntoResponse, HttpAppError>`. Use
//! `AppError` (or types that implement `Into<AppError>`) for errors so they become
//! `HttpAppError` and render consistently (status, body, logging).
//!
//! Error bodies are plain text: clients of the gateway only ever see the
//! client message, never a JSON envelope. The machine-readable code travels
//! in the `x-error-code` header, and details of sensitive errors go to the
//! log only.

use axum::{
    extract::multipart::MultipartRejection,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use scangate_core::{AppError, ErrorMetadata, LogLevel};
use scangate_storage::StorageError;

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from scangate-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<MultipartRejection> for HttpAppError {
    fn from(rejection: MultipartRejection) -> Self {
        HttpAppError(AppError::BadRequest(rejection.body_text()))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(_) => AppError::NotFound("Object not found".to_string()),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::UploadFailed(msg)
            | StorageError::DownloadFailed(msg)
            | StorageError::ListFailed(msg)
            | StorageError::BackendError(msg) => AppError::Storage(msg),
            StorageError::IoError(err) => AppError::Storage(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        };
        HttpAppError(app)
    }
}

pub const ERROR_CODE_HEADER: HeaderName = HeaderName::from_static("x-error-code");

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    let error_code = error.error_code();
    // Sensitive errors answer with a generic message, so the log keeps the chain.
    let details = error.is_sensitive().then(|| error.detailed_message());
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(
                error = %error,
                error_type,
                error_code,
                details = details.as_deref(),
                "Error occurred"
            );
        }
        LogLevel::Warn => {
            tracing::warn!(
                error = %error,
                error_type,
                error_code,
                details = details.as_deref(),
                "Error occurred"
            );
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error,
                error_type,
                error_code,
                details = details.as_deref(),
                "Error occurred"
            );
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        (
            status,
            [(
                ERROR_CODE_HEADER,
                HeaderValue::from_static(app_error.error_code()),
            )],
            app_error.client_message(),
        )
            .into_response()
    }
}
