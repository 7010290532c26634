//! Route table and HTTP middleware

use crate::error::HttpAppError;
use crate::handlers::{files, upload};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, Uri};
use axum::routing::{get, post};
use axum::Router;
use scangate_core::{AppError, Config};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Setup all application routes
///
/// Every route answers unsupported methods with 405 and unknown paths fall
/// through to 404, both as plain text. Paths that merely start with `/file`
/// (such as `/files`) still belong to the object passthrough.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let app = Router::new()
        .route("/", post(upload::upload_files).fallback(method_not_allowed))
        .route(
            "/upload",
            post(upload::upload_files).fallback(method_not_allowed),
        )
        .route(
            "/file",
            get(files::list_objects).fallback(method_not_allowed),
        )
        .route(
            "/file/",
            get(files::list_objects).fallback(method_not_allowed),
        )
        .route(
            "/file/{*key}",
            get(files::get_object)
                .put(files::put_object)
                .fallback(method_not_allowed),
        )
        .fallback(fallback)
        // Uploads are buffered whole; size limits belong to the platform in front
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

async fn method_not_allowed() -> HttpAppError {
    HttpAppError(AppError::MethodNotAllowed)
}

const FILE_PREFIX: &str = "/file";

/// Unmatched requests. Under the `/file` prefix the remainder is not a valid
/// key, so reads miss and writes are rejected.
async fn fallback(method: Method, uri: Uri) -> HttpAppError {
    let path = uri.path();
    if !path.starts_with(FILE_PREFIX) {
        return HttpAppError(AppError::NotFound("Not found".to_string()));
    }

    let error = match method {
        Method::GET | Method::HEAD => AppError::NotFound("Object not found".to_string()),
        Method::PUT => AppError::InvalidInput(format!("Invalid storage key: {}", path)),
        _ => AppError::MethodNotAllowed,
    };
    HttpAppError(error)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
