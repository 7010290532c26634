use serde::{Deserialize, Serialize};

/// Classified result of scanning one file.
///
/// `Clean` carries the entry reported to the client separately from the
/// verdict: a clean verdict delivered with an error status keeps the batch
/// successful but is reported as `Success:false, Reason:"Failed"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Clean { reported_success: bool, reason: String },
    Malicious { reason: String },
    ScanFailed { reason: String },
    UnknownResponse { reason: String },
    TransportError { reason: String },
}

impl ScanOutcome {
    pub fn clean() -> Self {
        ScanOutcome::Clean {
            reported_success: true,
            reason: "Scanned".to_string(),
        }
    }

    /// Clean verdict that arrived with a non-2xx status.
    pub fn clean_with_error_status() -> Self {
        ScanOutcome::Clean {
            reported_success: false,
            reason: "Failed".to_string(),
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            ScanOutcome::Clean { reason, .. }
            | ScanOutcome::Malicious { reason }
            | ScanOutcome::ScanFailed { reason }
            | ScanOutcome::UnknownResponse { reason }
            | ScanOutcome::TransportError { reason } => reason,
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, ScanOutcome::Clean { .. })
    }

    /// Outcomes that cause every file of the batch to be written to the bucket.
    ///
    /// Transport errors never reach the scanner's verdict logic, so they do
    /// not persist anything.
    pub fn triggers_batch_write(&self) -> bool {
        match self {
            ScanOutcome::Malicious { .. }
            | ScanOutcome::ScanFailed { .. }
            | ScanOutcome::UnknownResponse { .. } => true,
            ScanOutcome::Clean { .. } | ScanOutcome::TransportError { .. } => false,
        }
    }

    /// `Success` flag reported to the client. A malicious verdict is a
    /// successful scan, so it reports `true`.
    pub fn success_flag(&self) -> bool {
        match self {
            ScanOutcome::Clean {
                reported_success, ..
            } => *reported_success,
            ScanOutcome::Malicious { .. } => true,
            ScanOutcome::ScanFailed { .. }
            | ScanOutcome::UnknownResponse { .. }
            | ScanOutcome::TransportError { .. } => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ScanOutcome::Clean { .. } => "clean",
            ScanOutcome::Malicious { .. } => "malicious",
            ScanOutcome::ScanFailed { .. } => "scan_failed",
            ScanOutcome::UnknownResponse { .. } => "unknown_response",
            ScanOutcome::TransportError { .. } => "transport_error",
        }
    }
}

/// A scan outcome paired with the file it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileScanResult {
    pub filename: String,
    pub outcome: ScanOutcome,
}

impl FileScanResult {
    pub fn new(filename: impl Into<String>, outcome: ScanOutcome) -> Self {
        Self {
            filename: filename.into(),
            outcome,
        }
    }
}

/// Per-file entry of the upload response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileResult {
    pub success: bool,
    pub filename: String,
    pub reason: String,
}

impl From<&FileScanResult> for FileResult {
    fn from(result: &FileScanResult) -> Self {
        Self {
            success: result.outcome.success_flag(),
            filename: result.filename.clone(),
            reason: result.outcome.reason().to_string(),
        }
    }
}

/// Batch-level status, serialized as the strings `"true"` / `"false"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    #[serde(rename = "true")]
    True,
    #[serde(rename = "false")]
    False,
}

/// Response body of an upload request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UploadResultSet {
    pub success: OverallStatus,
    pub files: Vec<FileResult>,
}

impl UploadResultSet {
    /// Reduce per-file results into the response body. Order is preserved,
    /// so callers decide whether it reflects input or completion order.
    pub fn from_results(results: &[FileScanResult]) -> Self {
        let success = if results.iter().all(|r| r.outcome.is_clean()) {
            OverallStatus::True
        } else {
            OverallStatus::False
        };

        Self {
            success,
            files: results.iter().map(FileResult::from).collect(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success == OverallStatus::True
    }
}
