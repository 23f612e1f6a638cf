//! Error types for template application.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while applying a template to a batch of presentations.
///
/// The first three variants are batch-fatal preconditions. `HostCallFailed`
/// covers everything the automation host reports and is recoverable per file.
#[derive(Error, Debug)]
pub enum Error {
    /// The template document does not exist.
    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// The source folder could not be listed.
    #[error("Could not list source folder {}: {source}", path.display())]
    SourceFolderUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source folder holds no `.ppt`/`.pptx` files.
    #[error("No PowerPoint files found in {}", .0.display())]
    NoPresentationsFound(PathBuf),

    /// A call into the automation host failed.
    #[error("Host call '{call}' failed: {detail}")]
    HostCallFailed { call: &'static str, detail: String },

    /// Filesystem error outside of the host.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration could not be read or parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wrap a host failure for the named call.
    pub fn host(call: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::HostCallFailed {
            call,
            detail: detail.to_string(),
        }
    }

    /// Whether this error only affects the file being processed.
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::HostCallFailed { .. })
    }
}
