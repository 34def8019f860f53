//! WebAssembly bindings for PDF Compressor

use crate::{compress_pdf_bytes, CompressOptions, CompressionResult, ProfileKind};
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn options_for(profile: Option<String>) -> Result<CompressOptions, JsError> {
    let kind = match profile.as_deref() {
        None | Some("") => ProfileKind::default(),
        Some(name) => ProfileKind::from_name(name)
            .ok_or_else(|| JsError::new(&format!("Unknown compression profile: {}", name)))?,
    };
    Ok(CompressOptions::with_profile(kind))
}

/// Compress a PDF
///
/// # Arguments
/// * `pdf_bytes` - The input PDF file as a byte array
/// * `profile` - web, mobile, print or archive (default: web)
///
/// # Returns
/// The compressed PDF as a byte array, or throws an error
#[wasm_bindgen]
pub fn compress_pdf(pdf_bytes: &[u8], profile: Option<String>) -> Result<Vec<u8>, JsError> {
    let options = options_for(profile)?;
    let result = compress_pdf_bytes(pdf_bytes, &options).map_err(|e| JsError::new(&e.to_string()))?;
    Ok(result.compressed_bytes)
}

/// Compress a PDF with detailed result information
///
/// # Returns
/// A `CompressResultJs` object containing the compressed PDF and statistics
#[wasm_bindgen]
pub fn compress_pdf_with_info(
    pdf_bytes: &[u8],
    profile: Option<String>,
) -> Result<CompressResultJs, JsError> {
    let options = options_for(profile)?;
    let result = compress_pdf_bytes(pdf_bytes, &options).map_err(|e| JsError::new(&e.to_string()))?;
    Ok(CompressResultJs::from_result(result))
}

/// Result of PDF compression with statistics
#[wasm_bindgen]
pub struct CompressResultJs {
    pdf_bytes: Vec<u8>,
    original_size: usize,
    compressed_size: usize,
    compression_ratio: f64,
    processing_time_ms: f64,
    analysis_json: String,
    optimizations_json: String,
}

impl CompressResultJs {
    fn from_result(result: CompressionResult) -> Self {
        let analysis_json =
            serde_json::to_string(&result.analysis).unwrap_or_else(|_| "{}".to_string());
        let optimizations_json =
            serde_json::to_string(&result.optimizations).unwrap_or_else(|_| "[]".to_string());

        Self {
            original_size: result.original_size,
            compressed_size: result.compressed_size,
            compression_ratio: result.compression_ratio,
            processing_time_ms: result.processing_time_ms as f64,
            analysis_json,
            optimizations_json,
            pdf_bytes: result.compressed_bytes,
        }
    }
}

#[wasm_bindgen]
impl CompressResultJs {
    /// Get the compressed PDF bytes
    #[wasm_bindgen(getter)]
    pub fn pdf_bytes(&self) -> Vec<u8> {
        self.pdf_bytes.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn original_size(&self) -> usize {
        self.original_size
    }

    #[wasm_bindgen(getter)]
    pub fn compressed_size(&self) -> usize {
        self.compressed_size
    }

    /// Percentage saved; negative when the file grew
    #[wasm_bindgen(getter)]
    pub fn compression_ratio(&self) -> f64 {
        self.compression_ratio
    }

    #[wasm_bindgen(getter)]
    pub fn processing_time_ms(&self) -> f64 {
        self.processing_time_ms
    }

    /// Get the document analysis as JSON string
    #[wasm_bindgen(getter)]
    pub fn analysis_json(&self) -> String {
        self.analysis_json.clone()
    }

    /// Get the applied optimizations as JSON array of names
    #[wasm_bindgen(getter)]
    pub fn optimizations_json(&self) -> String {
        self.optimizations_json.clone()
    }
}
