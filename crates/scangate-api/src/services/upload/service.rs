use std::sync::Arc;
use std::time::Instant;

use axum::http::HeaderMap;
use futures::future::try_join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use scangate_core::{AppError, FileScanResult, UploadEntry, UploadResultSet, UploadedFile};
use scangate_services::ScannerService;
use scangate_storage::{Storage, StorageError};

/// Upload orchestrator
///
/// Workflow: scan every file concurrently → wait for all verdicts → persist
/// the whole batch when any verdict requires it → reduce to the response body.
#[derive(Clone)]
pub struct UploadService {
    scanner: ScannerService,
    storage: Arc<dyn Storage>,
}

impl UploadService {
    pub fn new(scanner: ScannerService, storage: Arc<dyn Storage>) -> Self {
        Self { scanner, storage }
    }

    /// Process one upload batch.
    ///
    /// Per-file scan problems never fail the batch; they are reported in the
    /// result set. Only an empty batch, a non-file entry in a batch that must
    /// be persisted, or a storage failure produce an error.
    pub async fn process(
        &self,
        entries: Vec<UploadEntry>,
        forwarded_headers: &HeaderMap,
    ) -> Result<UploadResultSet, AppError> {
        if entries.is_empty() {
            return Err(AppError::BadRequest(
                "No files found in the request".to_string(),
            ));
        }

        let start = Instant::now();
        let results = self.scan_all(&entries, forwarded_headers).await;

        let persisted = results.iter().any(|r| r.outcome.triggers_batch_write());
        if persisted {
            self.persist_batch(&entries).await?;
        }

        let result_set = UploadResultSet::from_results(&results);

        tracing::info!(
            entry_count = entries.len(),
            scanned_count = results.len(),
            all_clean = result_set.is_success(),
            persisted,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload batch processed"
        );

        Ok(result_set)
    }

    /// Fan out one scan per file and fan in once every scan has finished.
    /// Results are in completion order.
    async fn scan_all(
        &self,
        entries: &[UploadEntry],
        forwarded_headers: &HeaderMap,
    ) -> Vec<FileScanResult> {
        let mut scans: FuturesUnordered<_> = entries
            .iter()
            .filter_map(UploadEntry::as_file)
            .map(|file| self.scanner.scan_file(file, forwarded_headers))
            .collect();

        let mut results = Vec::with_capacity(scans.len());
        while let Some(result) = scans.next().await {
            results.push(result);
        }
        results
    }

    /// Write every file of the batch under its own name.
    ///
    /// Malicious files are written too. Writes run concurrently; when two
    /// files share a name the last write wins.
    pub async fn persist_batch(&self, entries: &[UploadEntry]) -> Result<(), AppError> {
        let files: Vec<&UploadedFile> = entries
            .iter()
            .map(|entry| match entry {
                UploadEntry::File(file) => Ok(file),
                UploadEntry::Text { .. } => Err(AppError::InvalidFileType),
            })
            .collect::<Result<_, _>>()?;

        let start = Instant::now();
        try_join_all(files.iter().map(|file| {
            self.storage
                .put(&file.name, file.data.clone(), file.content_type.as_deref())
        }))
        .await
        .map_err(|e| match e {
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            other => AppError::InternalWithSource {
                message: "Batch write failed".to_string(),
                source: anyhow::Error::new(other),
            },
        })?;

        tracing::info!(
            file_count = files.len(),
            backend = %self.storage.backend_type(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload batch persisted"
        );

        Ok(())
    }
}
