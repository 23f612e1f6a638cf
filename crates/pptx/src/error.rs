//! Error types for the OOXML host.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, PptxError>;

/// Errors raised while reading or editing a `.pptx` package.
#[derive(Error, Debug)]
pub enum PptxError {
    /// Failed to read or write the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP container error.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A part the package refers to is absent.
    #[error("Missing part: {0}")]
    MissingPart(String),

    /// The package structure is not a usable presentation.
    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    /// The file is a legacy binary `.ppt`, which this host cannot edit.
    #[error("Legacy binary .ppt files are not supported: {0}")]
    LegacyFormat(String),

    /// A slide position outside the presentation.
    #[error("Slide {0} out of range")]
    SlideOutOfRange(usize),

    /// A layout position outside the master's layout list.
    #[error("Layout {0} not found in slide master")]
    LayoutNotFound(usize),
}
