//! PDF Compression Library
//!
//! Core logic for shrinking PDFs. Shared between CLI and WASM targets.
//!
//! A document is analyzed, a compression profile is picked from the analysis,
//! the document is mutated in place (metadata stripped, oversized pages
//! scaled down) and then saved several times with different settings. The
//! smallest save that reloads as a PDF is returned.
//!
//! On native targets [`server::ServerCompressor`] can hand the file to a remote
//! compression service first and fall back to the local pipeline.

pub mod analysis;
pub mod attempts;
pub mod collab;
pub mod error;
pub mod mutate;
pub mod pipeline;
pub mod profile;
pub mod serialize;

#[cfg(not(target_arch = "wasm32"))]
pub mod remote;
#[cfg(not(target_arch = "wasm32"))]
pub mod server;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

#[cfg(test)]
mod test_support;

pub use analysis::{analyze, Complexity, DocumentAnalysis};
pub use error::CompressError;
pub use mutate::Optimization;
pub use pipeline::{
    compress_pdf_bytes, compression_ratio, CompressOptions, CompressionResult, Compressor,
};
pub use profile::{
    select_profile, select_profile_by_name, Aggressiveness, CompressionProfile, ProfileKind,
};
pub use serialize::{DocumentSaver, LopdfSaver};

/// File-based operations (CLI only)
#[cfg(not(target_arch = "wasm32"))]
pub mod file_ops {
    use super::*;
    use std::fs;
    use std::path::Path;

    /// Compress PDF from file path to file path
    pub fn compress_pdf_file(
        input_path: &Path,
        output_path: &Path,
        options: &CompressOptions,
    ) -> Result<CompressionResult, CompressError> {
        let input = fs::read(input_path)?;
        let result = compress_pdf_bytes(&input, options)
            .map_err(|e| match e {
                CompressError::Load(msg) => {
                    CompressError::Load(format!("{:?}: {}", input_path, msg))
                }
                other => other,
            })?;
        fs::write(output_path, &result.compressed_bytes)?;
        Ok(result)
    }

    /// Default output path: `compressed_<name>` next to the input
    pub fn default_output_path(input_path: &Path) -> std::path::PathBuf {
        let name = input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output.pdf".to_string());
        input_path.with_file_name(format!("compressed_{}", name))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::test_support::{document_with_pages, to_bytes};

        #[test]
        fn test_compress_file_roundtrip() {
            let dir = tempfile::tempdir().unwrap();
            let input = dir.path().join("in.pdf");
            let output = dir.path().join("out.pdf");
            fs::write(&input, to_bytes(&document_with_pages(&[(612.0, 792.0)]))).unwrap();

            let result = compress_pdf_file(&input, &output, &CompressOptions::default()).unwrap();
            assert_eq!(fs::read(&output).unwrap().len(), result.compressed_size);
        }

        #[test]
        fn test_missing_input_is_io_error() {
            let dir = tempfile::tempdir().unwrap();
            let err = compress_pdf_file(
                &dir.path().join("missing.pdf"),
                &dir.path().join("out.pdf"),
                &CompressOptions::default(),
            )
            .unwrap_err();
            assert!(matches!(err, CompressError::Io(_)));
        }

        #[test]
        fn test_default_output_path() {
            let path = default_output_path(Path::new("/tmp/docs/report.pdf"));
            assert_eq!(path, Path::new("/tmp/docs/compressed_report.pdf"));
        }
    }
}
