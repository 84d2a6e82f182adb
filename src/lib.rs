//! Evidence report composition: themed fixed layouts, an interpreter for
//! user-authored block templates, and PDF / DOCX output.

pub mod canvas;
pub mod config;
pub mod docx;
pub mod error;
pub mod font_metrics;
pub mod geometry;
pub mod images;
pub mod model;
pub mod pdf;
pub mod report;
pub mod server;
pub mod style;
pub mod templates;
pub mod theme;

pub use error::{ReportError, Result};
pub use model::{Evidence, EvidenceStatus, ReportConfig};
pub use report::{generate, generate_pdf, ReportFormat};
