//! Error types for the document pipeline

use std::io;
use thiserror::Error;

/// Errors raised while converting between document representations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    /// Error during parsing
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Error during serialization
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Errors raised while turning a selected file into canonical Markdown.
///
/// Every variant leaves the current document untouched.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not read '{name}': {source}")]
    Unreadable {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("unsupported file type '{0}' (expected .md, .markdown, .txt or .docx)")]
    UnsupportedType(String),
    #[error("'{0}' is not valid UTF-8 text")]
    InvalidText(String),
    #[error("'{name}' is not a readable .docx document: {reason}")]
    CorruptContainer { name: String, reason: String },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("import task failed: {0}")]
    Task(String),
}

/// Errors raised while capturing a rendered document into a PDF file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("rasterization failed: {0}")]
    Raster(String),
    #[error("PDF serialization failed: {0}")]
    Serialize(String),
    #[error("could not save '{filename}': {source}")]
    Save {
        filename: String,
        #[source]
        source: io::Error,
    },
    #[error("export cancelled")]
    Cancelled,
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Errors raised by a [`crate::store::SettingsStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("storage encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage quota exceeded ({needed} bytes needed, {quota} available)")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("store file {path} could not be read ({reason}), refusing to overwrite it")]
    Unreadable { path: String, reason: String },
}
