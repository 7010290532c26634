use anyhow::{Context, Result};
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use scangate_core::{Config, FileScanResult, ScanOutcome, UploadedFile};
use serde::Deserialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::{Duration, Instant};

/// Characters escaped by JavaScript's `encodeURI`. Everything else in the
/// ASCII range is left as is, including the reserved `;,/?:@&=+$#`.
const ENCODE_URI: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Inbound headers never forwarded to the scan endpoint.
const STRIPPED_HEADERS: [HeaderName; 13] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::HOST,
    header::USER_AGENT,
    // reqwest decodes nothing it did not ask for
    header::ACCEPT_ENCODING,
    // hop-by-hop
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

const REASON_MALICIOUS: &str = "Malicious";
const REASON_FAILED: &str = "Failed";
const REASON_UNKNOWN_ERROR: &str = "unknown error";
const REASON_UPLOAD_FAILED: &str = "upload failed";

/// JSON body the scan endpoint returns alongside a non-2xx status.
#[derive(Debug, Deserialize)]
struct ScannerResponse {
    #[serde(rename = "Success")]
    success: bool,
    #[serde(rename = "Message")]
    message: String,
}

/// Verdict carried by a non-2xx scanner response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    Malicious,
    Failed,
    Scanned,
    Other { success: bool, message: String },
}

impl ScanVerdict {
    /// Parse a scanner error body. Returns `None` when the body is not a
    /// `{"Success": bool, "Message": string}` document.
    pub fn parse(body: &str) -> Option<Self> {
        let response: ScannerResponse = serde_json::from_str(body).ok()?;
        Some(match (response.success, response.message.as_str()) {
            (true, "Malicious") => ScanVerdict::Malicious,
            (false, "Failed") => ScanVerdict::Failed,
            (true, "Scanned") => ScanVerdict::Scanned,
            (success, _) => ScanVerdict::Other {
                success,
                message: response.message,
            },
        })
    }

    pub fn into_outcome(self) -> ScanOutcome {
        match self {
            ScanVerdict::Malicious => ScanOutcome::Malicious {
                reason: REASON_MALICIOUS.to_string(),
            },
            ScanVerdict::Failed => ScanOutcome::ScanFailed {
                reason: REASON_FAILED.to_string(),
            },
            ScanVerdict::Scanned => ScanOutcome::clean_with_error_status(),
            ScanVerdict::Other { message, .. } => ScanOutcome::UnknownResponse { reason: message },
        }
    }
}

/// Client for the external malware-scanning endpoint.
///
/// Holds a pooled `reqwest::Client`; clones share the pool.
#[derive(Clone)]
pub struct ScannerService {
    http_client: reqwest::Client,
    scanner_url: String,
    user_agent: HeaderValue,
}

impl Debug for ScannerService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ScannerService")
            .field("scanner_url", &self.scanner_url)
            .finish()
    }
}

impl ScannerService {
    /// Create a new ScannerService.
    ///
    /// # Arguments
    /// * `scanner_url` - Scan endpoint, e.g. `https://bfa.srnd.net/upload`
    /// * `user_agent` - Value sent as `User-Agent` on every scan request
    /// * `timeout` - Optional per-request timeout; `None` waits indefinitely
    pub fn new(scanner_url: String, user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .context("Failed to create HTTP client for scan endpoint")?;

        let user_agent = HeaderValue::from_str(user_agent)
            .context("Scanner user agent is not a valid header value")?;

        Ok(Self {
            http_client,
            scanner_url,
            user_agent,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.scanner_url().to_string(),
            config.scanner_user_agent(),
            config.scanner_timeout(),
        )
    }

    pub fn scanner_url(&self) -> &str {
        &self.scanner_url
    }

    /// Target URL for one file: the endpoint plus `fn=<encodeURI(name)>`.
    fn request_url(&self, filename: &str) -> String {
        let separator = if self.scanner_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{}fn={}",
            self.scanner_url,
            separator,
            utf8_percent_encode(filename, ENCODE_URI)
        )
    }

    fn forwarded_headers(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut headers = inbound.clone();
        for name in STRIPPED_HEADERS {
            headers.remove(&name);
        }
        headers.insert(header::USER_AGENT, self.user_agent.clone());
        headers
    }

    /// Forward one file to the scan endpoint and classify the response.
    ///
    /// Never fails: transport and protocol problems become outcomes so a
    /// single file cannot abort the batch.
    #[tracing::instrument(
        skip(self, file, inbound_headers),
        fields(filename = %file.name, size_bytes = file.size())
    )]
    pub async fn scan_file(&self, file: &UploadedFile, inbound_headers: &HeaderMap) -> FileScanResult {
        let start = Instant::now();
        tracing::info!(scanner_url = %self.scanner_url, "checking");

        let outcome = match self.send(file, inbound_headers).await {
            Ok((status, body)) => classify(status, body.as_deref()),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    scanner_url = %self.scanner_url,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Failed to upload file to scan endpoint"
                );
                ScanOutcome::TransportError {
                    reason: REASON_UPLOAD_FAILED.to_string(),
                }
            }
        };

        tracing::info!(
            outcome = outcome.kind(),
            reason = outcome.reason(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File scan classified"
        );

        FileScanResult::new(file.name.clone(), outcome)
    }

    /// Send the request. The body is only read for non-2xx responses.
    async fn send(
        &self,
        file: &UploadedFile,
        inbound_headers: &HeaderMap,
    ) -> Result<(StatusCode, Option<String>), reqwest::Error> {
        let form = Form::new().part("file", file_part(file));

        let response = self
            .http_client
            .post(self.request_url(&file.name))
            .headers(self.forwarded_headers(inbound_headers))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok((status, None));
        }

        let body = response.text().await?;
        Ok((status, Some(body)))
    }
}

fn file_part(file: &UploadedFile) -> Part {
    let part = || Part::bytes(file.data.to_vec()).file_name(file.name.clone());
    match file.content_type.as_deref() {
        Some(content_type) => part().mime_str(content_type).unwrap_or_else(|_| part()),
        None => part(),
    }
}

/// Map a scanner response to an outcome. `body` is `None` for 2xx responses.
fn classify(status: StatusCode, body: Option<&str>) -> ScanOutcome {
    let Some(body) = body.filter(|_| !status.is_success()) else {
        return ScanOutcome::clean();
    };

    let status_text = status.canonical_reason().unwrap_or("");
    match ScanVerdict::parse(body) {
        Some(verdict @ ScanVerdict::Other { .. }) => {
            tracing::warn!(
                status = status.as_u16(),
                status_text,
                body,
                "Scan endpoint returned an unrecognized verdict"
            );
            verdict.into_outcome()
        }
        Some(verdict) => verdict.into_outcome(),
        None => {
            tracing::warn!(
                status = status.as_u16(),
                status_text,
                body,
                "Scan endpoint returned an unexpected response"
            );
            ScanOutcome::ScanFailed {
                reason: REASON_UNKNOWN_ERROR.to_string(),
            }
        }
    }
}
