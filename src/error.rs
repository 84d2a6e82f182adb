//! Error types for report generation

use thiserror::Error;

/// Errors surfaced by the report facade. Image failures never appear here;
/// they are absorbed into placeholders during rendering.
#[derive(Error, Debug)]
pub enum ReportError {
    /// `templateId = "custom"` without a custom template attached
    #[error("template \"custom\" selected but no custom template was provided")]
    MissingCustomTemplate,

    /// The PDF writer rejected the document
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Error writing the DOCX package
    #[error("DOCX archive error: {0}")]
    Docx(#[from] zip::result::ZipError),

    /// Error re-encoding an image for the flow document
    #[error("image encode error: {0}")]
    ImageEncode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    /// True for errors caused by the request rather than the engine.
    pub fn is_validation(&self) -> bool {
        matches!(self, ReportError::MissingCustomTemplate | ReportError::Json(_))
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
