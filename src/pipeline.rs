//! Compression pipeline: load, analyze, select, mutate, save, report.

use crate::analysis::{analyze, DocumentAnalysis};
use crate::error::CompressError;
use crate::mutate::{mutate, Optimization};
use crate::profile::{select_profile, ProfileKind};
use crate::serialize::{serialize, DocumentSaver, LopdfSaver};
use lopdf::Document;
use serde::Serialize;

/// Options for PDF compression
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// Requested compression profile
    pub compression_profile: ProfileKind,
    /// Image quality (0.0-1.0). Reserved: not used by the current pipeline
    pub image_quality: f32,
    /// Reserved: not used by the current pipeline
    pub enable_image_downsampling: bool,
    /// Reserved: not used by the current pipeline
    pub enable_font_optimization: bool,
    /// Reserved: not used by the current pipeline
    pub enable_content_compression: bool,
    /// Reserved: not used by the current pipeline
    pub enable_duplicate_removal: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            compression_profile: ProfileKind::Web,
            image_quality: 0.75,
            enable_image_downsampling: true,
            enable_font_optimization: true,
            enable_content_compression: true,
            enable_duplicate_removal: true,
        }
    }
}

impl CompressOptions {
    pub fn with_profile(profile: ProfileKind) -> Self {
        Self {
            compression_profile: profile,
            ..Self::default()
        }
    }
}

/// Result of a successful compression
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionResult {
    #[serde(skip)]
    pub compressed_bytes: Vec<u8>,
    pub original_size: usize,
    pub compressed_size: usize,
    /// Percentage saved; negative when the output grew
    pub compression_ratio: f64,
    pub analysis: DocumentAnalysis,
    pub optimizations: Vec<Optimization>,
    pub processing_time_ms: u64,
    /// Name of the save attempt whose output was kept
    pub winning_attempt: &'static str,
}

/// `(original - compressed) / original * 100`, or 0 for empty input
pub fn compression_ratio(original_size: usize, compressed_size: usize) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    (original_size as f64 - compressed_size as f64) / original_size as f64 * 100.0
}

/// Runs the pipeline with a particular saver
#[derive(Debug, Clone, Default)]
pub struct Compressor<S = LopdfSaver> {
    saver: S,
}

impl Compressor<LopdfSaver> {
    pub fn new() -> Self {
        Self { saver: LopdfSaver }
    }
}

impl<S: DocumentSaver> Compressor<S> {
    pub fn with_saver(saver: S) -> Self {
        Self { saver }
    }

    pub fn saver(&self) -> &S {
        &self.saver
    }

    /// Compress a PDF held in memory.
    ///
    /// Either returns a complete result whose bytes reload as a PDF, or an
    /// error. Only `options.compression_profile` affects the output.
    pub fn compress(
        &self,
        pdf_bytes: &[u8],
        options: &CompressOptions,
    ) -> Result<CompressionResult, CompressError> {
        let stopwatch = Stopwatch::start();
        let original_size = pdf_bytes.len();
        log::info!("Compressing PDF ({} bytes)", original_size);

        let mut doc = load_document(pdf_bytes)?;

        let analysis = analyze(&doc, original_size);
        let profile = select_profile(options.compression_profile, &analysis);
        log::info!("Using compression profile: {}", profile.name);
        log_reserved_options(options);

        let mut optimizations = mutate(&mut doc, &analysis, &profile);

        let output = serialize(&doc, &profile, &self.saver)?;
        optimizations.push(Optimization::MultiAttemptSerialization);

        let compressed_size = output.bytes.len();
        let compression_ratio = compression_ratio(original_size, compressed_size);
        let processing_time_ms = stopwatch.elapsed_ms();

        log::info!(
            "Compression completed: {} -> {} bytes ({:.1}%) in {} ms",
            original_size,
            compressed_size,
            compression_ratio,
            processing_time_ms
        );

        Ok(CompressionResult {
            compressed_bytes: output.bytes,
            original_size,
            compressed_size,
            compression_ratio,
            analysis,
            optimizations,
            processing_time_ms,
            winning_attempt: output.attempt,
        })
    }
}

/// Load a PDF as permissively as lopdf allows.
///
/// Files lopdf can decrypt with an empty password load normally. A file that
/// still carries `/Encrypt` after loading needs a user password; its objects
/// were never read, so it is rejected along with any file whose catalog does
/// not resolve.
pub fn load_document(pdf_bytes: &[u8]) -> Result<Document, CompressError> {
    let doc = Document::load_mem(pdf_bytes).map_err(|e| CompressError::Load(e.to_string()))?;

    if doc.trailer.has(b"Encrypt") {
        return Err(CompressError::Load(
            "PDF is password protected and could not be decrypted".to_string(),
        ));
    }
    if doc.was_encrypted() {
        log::info!("PDF was encrypted without a user password; decrypted on load");
    }
    doc.catalog()
        .map_err(|e| CompressError::Load(format!("document catalog is unreadable: {}", e)))?;

    log::debug!("Loaded PDF {} with {} objects", doc.version, doc.objects.len());
    Ok(doc)
}

fn log_reserved_options(options: &CompressOptions) {
    let defaults = CompressOptions::default();
    if options.image_quality != defaults.image_quality
        || options.enable_image_downsampling != defaults.enable_image_downsampling
        || options.enable_font_optimization != defaults.enable_font_optimization
        || options.enable_content_compression != defaults.enable_content_compression
        || options.enable_duplicate_removal != defaults.enable_duplicate_removal
    {
        log::debug!("Image, font, content and duplicate options are reserved and have no effect");
    }
}

/// Compress a PDF held in memory with lopdf's writer.
pub fn compress_pdf_bytes(
    pdf_bytes: &[u8],
    options: &CompressOptions,
) -> Result<CompressionResult, CompressError> {
    Compressor::new().compress(pdf_bytes, options)
}

/// Wall-clock timer that also works in the browser
pub(crate) struct Stopwatch {
    #[cfg(not(target_arch = "wasm32"))]
    start: std::time::Instant,
    #[cfg(target_arch = "wasm32")]
    start: f64,
}

impl Stopwatch {
    pub(crate) fn start() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            start: std::time::Instant::now(),
            #[cfg(target_arch = "wasm32")]
            start: js_sys::Date::now(),
        }
    }

    pub(crate) fn elapsed_ms(&self) -> u64 {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.start.elapsed().as_millis() as u64
        }
        #[cfg(target_arch = "wasm32")]
        {
            (js_sys::Date::now() - self.start).max(0.0) as u64
        }
    }
}
