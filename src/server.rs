//! Remote-first compression with a local fallback.
//!
//! The remote service is tried first. Any failure there (transport, status,
//! timeout, bad body, unusable file) is logged and the local pipeline runs
//! instead. The first route that produces a loadable PDF wins; the two are
//! never compared by size.

use crate::analysis::DocumentAnalysis;
use crate::attempts::{first_success, Attempt};
use crate::collab::{ActivityRecord, ActivitySink, ActivityStatus, StorageSink};
use crate::error::CompressError;
use crate::mutate::Optimization;
use crate::pipeline::{compression_ratio, CompressOptions, Compressor, Stopwatch};
use crate::remote::{
    CompressionLevel, CompressionService, HttpCompressionService, RemoteConfig, RemoteError,
};
use lopdf::Document;
use serde::Serialize;

pub const REMOTE_ROUTE: &str = "Remote Service";
pub const LOCAL_ROUTE: &str = "Local Pipeline";

const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Remote,
    Local,
}

/// Which route produced the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeSource {
    Remote,
    Local,
}

/// Result of a server-side compression
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerOutcome {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub source: OutcomeSource,
    pub original_size: usize,
    pub compressed_size: usize,
    pub compression_ratio: f64,
    pub processing_time_ms: u64,
    /// Only the local pipeline analyzes the document
    pub analysis: Option<DocumentAnalysis>,
    pub optimizations: Vec<Optimization>,
    /// Set when a storage sink accepted the output
    pub download_url: Option<String>,
}

struct Delivered {
    bytes: Vec<u8>,
    source: OutcomeSource,
    analysis: Option<DocumentAnalysis>,
    optimizations: Vec<Optimization>,
}

/// Compresses with an optional remote service, falling back to the local pipeline
pub struct ServerCompressor {
    service: Option<Box<dyn CompressionService>>,
    compressor: Compressor,
    activity: Option<Box<dyn ActivitySink>>,
    storage: Option<Box<dyn StorageSink>>,
}

impl Default for ServerCompressor {
    fn default() -> Self {
        Self::local_only()
    }
}

impl ServerCompressor {
    /// No remote service: every call runs locally
    pub fn local_only() -> Self {
        Self {
            service: None,
            compressor: Compressor::new(),
            activity: None,
            storage: None,
        }
    }

    pub fn with_service(service: Box<dyn CompressionService>) -> Self {
        Self {
            service: Some(service),
            ..Self::local_only()
        }
    }

    /// HTTP service from a config
    pub fn from_config(config: RemoteConfig) -> Result<Self, CompressError> {
        let service = HttpCompressionService::new(config)?;
        Ok(Self::with_service(Box::new(service)))
    }

    /// HTTP service from `PDF_COMPRESSION_API`, or local only when unset
    pub fn from_env() -> Result<Self, CompressError> {
        match RemoteConfig::from_env() {
            Some(config) => Self::from_config(config),
            None => Ok(Self::local_only()),
        }
    }

    pub fn activity_sink(mut self, sink: Box<dyn ActivitySink>) -> Self {
        self.activity = Some(sink);
        self
    }

    pub fn storage_sink(mut self, sink: Box<dyn StorageSink>) -> Self {
        self.storage = Some(sink);
        self
    }

    pub fn has_remote(&self) -> bool {
        self.service.is_some()
    }

    /// Compress `pdf_bytes`, remote first when a service is configured.
    ///
    /// Fails only when the local pipeline fails too. Activity and storage
    /// errors are logged and ignored.
    pub fn compress(
        &self,
        pdf_bytes: &[u8],
        file_name: &str,
        level: CompressionLevel,
        user_id: Option<&str>,
    ) -> Result<ServerOutcome, CompressError> {
        let stopwatch = Stopwatch::start();
        let original_size = pdf_bytes.len();

        let mut routes = Vec::with_capacity(2);
        if self.service.is_some() {
            routes.push(Attempt::new(REMOTE_ROUTE, Route::Remote));
        }
        routes.push(Attempt::new(LOCAL_ROUTE, Route::Local));

        let delivered = first_success(&routes, |attempt| match attempt.params {
            Route::Remote => self.compress_remote(pdf_bytes, file_name, level),
            Route::Local => self.compress_local(pdf_bytes, level),
        });

        let processing_time_ms = stopwatch.elapsed_ms();

        let delivered = match delivered {
            Ok((route, delivered)) => {
                log::info!("{} produced {} bytes", route, delivered.bytes.len());
                delivered
            }
            Err(mut failures) => {
                self.record_activity(ActivityRecord {
                    user_id: user_id.map(str::to_string),
                    file_name: file_name.to_string(),
                    file_size: original_size,
                    processed_size: 0,
                    status: ActivityStatus::Failed,
                    processing_time_ms,
                    compression_ratio: 0.0,
                });
                return Err(match failures.pop() {
                    Some((_, e)) => e,
                    None => CompressError::Save("no compression route available".to_string()),
                });
            }
        };

        let compressed_size = delivered.bytes.len();
        let compression_ratio = compression_ratio(original_size, compressed_size);

        let download_url = self.store_output(&delivered.bytes, file_name);

        self.record_activity(ActivityRecord {
            user_id: user_id.map(str::to_string),
            file_name: file_name.to_string(),
            file_size: original_size,
            processed_size: compressed_size,
            status: ActivityStatus::Completed,
            processing_time_ms,
            compression_ratio,
        });

        Ok(ServerOutcome {
            bytes: delivered.bytes,
            source: delivered.source,
            original_size,
            compressed_size,
            compression_ratio,
            processing_time_ms,
            analysis: delivered.analysis,
            optimizations: delivered.optimizations,
            download_url,
        })
    }

    fn compress_remote(
        &self,
        pdf_bytes: &[u8],
        file_name: &str,
        level: CompressionLevel,
    ) -> Result<Delivered, CompressError> {
        let service = self
            .service
            .as_ref()
            .ok_or_else(|| CompressError::Save("no remote service configured".to_string()))?;

        let output = service.compress(pdf_bytes, file_name, level.remote_quality())?;
        if output.bytes.is_empty() {
            return Err(RemoteError::InvalidPdf("empty file".to_string()).into());
        }
        let doc = Document::load_mem(&output.bytes)
            .map_err(|e| RemoteError::InvalidPdf(e.to_string()))?;
        doc.catalog()
            .map_err(|e| RemoteError::InvalidPdf(format!("catalog unreadable: {}", e)))?;

        if let Some(ratio) = output.reported_ratio {
            log::debug!("Service reported a {:.1}% reduction", ratio);
        }

        Ok(Delivered {
            bytes: output.bytes,
            source: OutcomeSource::Remote,
            analysis: None,
            optimizations: Vec::new(),
        })
    }

    fn compress_local(
        &self,
        pdf_bytes: &[u8],
        level: CompressionLevel,
    ) -> Result<Delivered, CompressError> {
        let options = CompressOptions::with_profile(level.local_profile());
        let result = self.compressor.compress(pdf_bytes, &options)?;
        Ok(Delivered {
            bytes: result.compressed_bytes,
            source: OutcomeSource::Local,
            analysis: Some(result.analysis),
            optimizations: result.optimizations,
        })
    }

    fn store_output(&self, bytes: &[u8], file_name: &str) -> Option<String> {
        let storage = self.storage.as_ref()?;
        match storage.store(bytes, &format!("compressed_{}", file_name), PDF_MIME) {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("Could not store compressed file: {}", e);
                None
            }
        }
    }

    fn record_activity(&self, record: ActivityRecord) {
        if let Some(sink) = &self.activity {
            if let Err(e) = sink.record(&record) {
                log::warn!("Could not record activity: {}", e);
            }
        }
    }
}
