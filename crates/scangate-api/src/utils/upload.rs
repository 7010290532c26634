//! Common utilities for the upload handler

use axum::extract::Multipart;
use scangate_core::{AppError, UploadEntry, UploadedFile};

/// Form field carrying the files of an upload batch.
pub const FILE_FIELD: &str = "file";

/// Collect every entry of the `file` field, in submission order.
///
/// Parts with a filename become `UploadEntry::File`; parts without one are
/// plain form values and become `UploadEntry::Text`. Other fields are ignored.
pub async fn extract_upload_entries(mut multipart: Multipart) -> Result<Vec<UploadEntry>, AppError> {
    let mut entries = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        match field.file_name().map(|s: &str| s.to_string()) {
            Some(filename) => {
                let content_type = field.content_type().map(|s: &str| s.to_string());
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;
                entries.push(UploadEntry::File(UploadedFile::new(
                    filename,
                    content_type,
                    data,
                )));
            }
            None => {
                let value = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read form value: {}", e))
                })?;
                entries.push(UploadEntry::Text { value });
            }
        }
    }

    Ok(entries)
}
