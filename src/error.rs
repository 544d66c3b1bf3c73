//! Structured error types for xlembed.
//!
//! Only run-fatal conditions live here. Per-URL download problems are values
//! ([`crate::plan::PlacementFailure`]) and never become an `XlembedError`.

/// All errors that can abort an embedding run.
#[derive(Debug, thiserror::Error)]
pub enum XlembedError {
    /// XML parsing or writing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration document could not be decoded.
    #[error("Config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The header row has no cell matching the configured label.
    #[error("No column with header '{label}' found in row 1")]
    HeaderNotFound { label: String },

    /// An option value is missing or out of range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A package part the run depends on is absent.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// Invalid cell reference.
    #[error("Invalid cell reference: {0}")]
    CellRef(String),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XlembedError>;

impl XlembedError {
    /// Whether this error stems from the run configuration rather than the
    /// input document or the environment.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::HeaderNotFound { .. } | Self::Config(_) | Self::Json(_))
    }
}
