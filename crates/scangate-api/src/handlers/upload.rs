use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::extract_upload_entries;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// Scan an upload batch and report per-file verdicts.
///
/// The inbound headers are forwarded to the scan endpoint.
#[tracing::instrument(skip(state, headers, multipart))]
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let entries = extract_upload_entries(multipart?).await?;
    let result_set = state.upload_service().process(entries, &headers).await?;
    Ok(Json(result_set))
}
