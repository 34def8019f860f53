//! Client for a remote, Ghostscript-backed compression service.
//!
//! Protocol:
//! * `POST {base}/compress` with a multipart body `{file, quality}` returns
//!   `{success, compression_ratio?, original_size?, compressed_size?, download_id?, error?}`
//! * `GET {base}/download/{download_id}` returns the compressed bytes
//! * `GET {base}/health` returns the service status

use crate::error::CompressError;
use crate::profile::ProfileKind;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the service base URL
pub const SERVICE_URL_ENV: &str = "PDF_COMPRESSION_API";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Server-side compression level requested by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionLevel {
    Light,
    #[default]
    Medium,
    High,
    Maximum,
}

impl CompressionLevel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Some(CompressionLevel::Light),
            "medium" => Some(CompressionLevel::Medium),
            "high" => Some(CompressionLevel::High),
            "maximum" => Some(CompressionLevel::Maximum),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionLevel::Light => "light",
            CompressionLevel::Medium => "medium",
            CompressionLevel::High => "high",
            CompressionLevel::Maximum => "maximum",
        }
    }

    /// The service's quality setting for this level
    pub fn remote_quality(&self) -> RemoteQuality {
        match self {
            CompressionLevel::Light => RemoteQuality::Printer,
            CompressionLevel::Medium | CompressionLevel::High => RemoteQuality::Ebook,
            CompressionLevel::Maximum => RemoteQuality::Screen,
        }
    }

    /// Profile used when compressing locally instead
    pub fn local_profile(&self) -> ProfileKind {
        match self {
            CompressionLevel::Light => ProfileKind::Print,
            CompressionLevel::Medium => ProfileKind::Archive,
            CompressionLevel::High => ProfileKind::Web,
            CompressionLevel::Maximum => ProfileKind::Mobile,
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality vocabulary understood by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteQuality {
    Screen,
    Ebook,
    Printer,
}

impl RemoteQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteQuality::Screen => "screen",
            RemoteQuality::Ebook => "ebook",
            RemoteQuality::Printer => "printer",
        }
    }
}

/// Connection settings for the remote service
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Bound on the compress request, upload and processing included
    pub request_timeout: Duration,
    /// Bound on the result download
    pub download_timeout: Duration,
    /// Larger inputs are not sent at all
    pub max_upload_bytes: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout: Duration::from_secs(300),
            download_timeout: Duration::from_secs(30),
            max_upload_bytes: 100 * 1024 * 1024,
        }
    }
}

impl RemoteConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Configuration from `PDF_COMPRESSION_API`, if set and non-empty
    pub fn from_env() -> Option<Self> {
        std::env::var(SERVICE_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(Self::with_base_url)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Error type for remote compression
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Input too large for remote compression: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Service rejected the file: {0}")]
    Rejected(String),

    #[error("Malformed service response: {0}")]
    MalformedResponse(String),

    #[error("Service response has no download id")]
    MissingDownloadId,

    #[error("Download failed with status {0}")]
    Download(u16),

    #[error("Downloaded file is not a usable PDF: {0}")]
    InvalidPdf(String),
}

impl From<RemoteError> for CompressError {
    fn from(e: RemoteError) -> Self {
        CompressError::Remote(e.to_string())
    }
}

/// JSON body returned by `POST /compress`
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCompressResponse {
    pub success: bool,
    #[serde(default)]
    pub compression_ratio: Option<f64>,
    #[serde(default)]
    pub original_size: Option<u64>,
    #[serde(default)]
    pub compressed_size: Option<u64>,
    #[serde(default)]
    pub download_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// JSON body returned by `GET /health`
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub ghostscript_available: Option<bool>,
    #[serde(default)]
    pub ghostscript_working: Option<bool>,
}

impl ServiceHealth {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" && self.ghostscript_available.unwrap_or(true)
    }
}

/// Compressed file produced by a remote service
#[derive(Debug, Clone)]
pub struct RemoteOutput {
    pub bytes: Vec<u8>,
    /// Ratio as reported by the service, if any
    pub reported_ratio: Option<f64>,
}

/// A service that compresses whole PDF files
pub trait CompressionService {
    fn compress(
        &self,
        pdf_bytes: &[u8],
        file_name: &str,
        quality: RemoteQuality,
    ) -> Result<RemoteOutput, RemoteError>;
}

/// Parse and check the compress response, returning the download id
pub fn parse_compress_response(body: &str) -> Result<RemoteCompressResponse, RemoteError> {
    let response: RemoteCompressResponse =
        serde_json::from_str(body).map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;

    if !response.success {
        return Err(RemoteError::Rejected(
            response
                .error
                .clone()
                .unwrap_or_else(|| "Compression failed".to_string()),
        ));
    }

    match response.download_id.as_deref() {
        Some(id) if !id.trim().is_empty() => Ok(response),
        _ => Err(RemoteError::MissingDownloadId),
    }
}

/// HTTP client for the remote service
#[derive(Debug, Clone)]
pub struct HttpCompressionService {
    client: Client,
    config: RemoteConfig,
}

impl HttpCompressionService {
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Query the service health endpoint
    pub fn health(&self) -> Result<ServiceHealth, RemoteError> {
        let response = self
            .client
            .get(self.config.endpoint("health"))
            .timeout(HEALTH_TIMEOUT)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| RemoteError::MalformedResponse(e.to_string()))
    }

    fn download(&self, download_id: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self
            .client
            .get(self.config.endpoint(&format!("download/{}", download_id)))
            .timeout(self.config.download_timeout)
            .send()?;

        if !response.status().is_success() {
            return Err(RemoteError::Download(response.status().as_u16()));
        }
        Ok(response.bytes()?.to_vec())
    }
}

impl CompressionService for HttpCompressionService {
    fn compress(
        &self,
        pdf_bytes: &[u8],
        file_name: &str,
        quality: RemoteQuality,
    ) -> Result<RemoteOutput, RemoteError> {
        if pdf_bytes.len() > self.config.max_upload_bytes {
            return Err(RemoteError::TooLarge {
                size: pdf_bytes.len(),
                limit: self.config.max_upload_bytes,
            });
        }

        let part = Part::bytes(pdf_bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part).text("quality", quality.as_str());

        log::info!(
            "Sending {} bytes to {} (quality {})",
            pdf_bytes.len(),
            self.config.base_url,
            quality.as_str()
        );
        let response = self
            .client
            .post(self.config.endpoint("compress"))
            .multipart(form)
            .timeout(self.config.request_timeout)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = parse_compress_response(&body)?;
        let download_id = parsed.download_id.as_deref().unwrap_or_default();
        let bytes = self.download(download_id)?;

        log::info!(
            "Remote compression: {} -> {} bytes",
            pdf_bytes.len(),
            bytes.len()
        );

        Ok(RemoteOutput {
            bytes,
            reported_ratio: parsed.compression_ratio,
        })
    }
}
