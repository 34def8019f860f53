use thiserror::Error;

/// Error type for PDF compression operations
#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Failed to load PDF: {0}")]
    Load(String),

    #[error("PDF compression failed: {0}")]
    Save(String),

    #[error("Remote compression failed: {0}")]
    Remote(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single save attempt. Expected during multi-attempt saving.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttemptError {
    #[error("save failed: {0}")]
    Save(String),

    #[error("output does not reload as a PDF: {0}")]
    Unloadable(String),

    #[error("save produced no bytes")]
    Empty,

    #[error("output is missing part of the document: {0}")]
    Incomplete(String),
}

/// Failure reported by an activity or storage collaborator.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}
