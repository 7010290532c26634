//! Bucket passthrough: list, read, and write objects by key.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[tracing::instrument(skip(state))]
pub async fn list_objects(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let objects = state.storage.list().await?;
    Ok(Json(objects))
}

#[tracing::instrument(skip(state))]
pub async fn get_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, HttpAppError> {
    let object = state.storage.get(&key).await?;
    let content_type = object
        .meta
        .content_type()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    Ok(([(header::CONTENT_TYPE, content_type)], object.data).into_response())
}

#[tracing::instrument(skip(state, headers, body), fields(size_bytes = body.len()))]
pub async fn put_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    state.storage.put(&key, body, content_type).await?;

    Ok((StatusCode::OK, "Object uploaded successfully"))
}
