//! Optional collaborators: activity logging and output storage.
//!
//! Both are best-effort. Callers log their errors and carry on; a failing
//! collaborator never fails a compression.

use crate::error::CollaboratorError;
use serde::Serialize;

/// One processed file, as recorded in the activity log
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub user_id: Option<String>,
    pub file_name: String,
    pub file_size: usize,
    pub processed_size: usize,
    pub status: ActivityStatus,
    pub processing_time_ms: u64,
    pub compression_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Completed,
    Failed,
}

/// Accepts activity records
pub trait ActivitySink {
    fn record(&self, record: &ActivityRecord) -> Result<(), CollaboratorError>;
}

/// Stores output files and hands back a download URL
pub trait StorageSink {
    fn store(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> Result<String, CollaboratorError>;
}

#[cfg(not(target_arch = "wasm32"))]
pub use fs_sinks::{DirectoryStorage, JsonLinesActivityLog};

#[cfg(not(target_arch = "wasm32"))]
mod fs_sinks {
    use super::*;
    use std::fs::{self, OpenOptions};
    use std::io::Write;
    use std::path::{Path, PathBuf};

    /// Appends one JSON object per line to a file
    #[derive(Debug, Clone)]
    pub struct JsonLinesActivityLog {
        path: PathBuf,
    }

    impl JsonLinesActivityLog {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl ActivitySink for JsonLinesActivityLog {
        fn record(&self, record: &ActivityRecord) -> Result<(), CollaboratorError> {
            let mut line = serde_json::to_vec(record)?;
            line.push(b'\n');
            let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
            file.write_all(&line)?;
            Ok(())
        }
    }

    /// Writes files into a directory and returns `file://` URLs
    #[derive(Debug, Clone)]
    pub struct DirectoryStorage {
        root: PathBuf,
    }

    impl DirectoryStorage {
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into() }
        }
    }

    impl StorageSink for DirectoryStorage {
        fn store(
            &self,
            bytes: &[u8],
            file_name: &str,
            mime_type: &str,
        ) -> Result<String, CollaboratorError> {
            let name = Path::new(file_name)
                .file_name()
                .ok_or_else(|| {
                    CollaboratorError::Unavailable(format!("invalid file name {:?}", file_name))
                })?;

            fs::create_dir_all(&self.root)?;
            let target = self.root.join(name);
            fs::write(&target, bytes)?;
            log::debug!("Stored {} ({}, {} bytes)", target.display(), mime_type, bytes.len());

            let absolute = fs::canonicalize(&target)?;
            Ok(format!("file://{}", absolute.display()))
        }
    }
}
