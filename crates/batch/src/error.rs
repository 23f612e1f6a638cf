//! Error types for batch jobs.

use thiserror::Error;

/// Errors that can occur while submitting or running a job.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Conversion(#[from] retemplate_core::Error),

    #[error("Template must be a .ppt or .pptx file: {0}")]
    InvalidTemplate(String),

    #[error("Presentations must be uploaded as a .zip archive: {0}")]
    InvalidArchive(String),

    #[error("archive contains no .ppt/.pptx files")]
    NoPresentationsInArchive { other_files: Vec<String> },

    #[error("No PowerPoint file was converted")]
    NothingConverted,

    #[error("Job aborted: {0}")]
    Panicked(String),

    #[error("No converted archive for job {0}")]
    ResultNotFound(String),
}

/// Result type for batch operations.
pub type Result<T> = std::result::Result<T, BatchError>;
