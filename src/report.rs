//! Report facade.
//!
//! Picks a template, renders cover and content onto a fresh canvas and
//! serializes it. The DOCX path shares only the evidence, theme and cover
//! metadata with the PDF path.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::canvas::Canvas;
use crate::docx;
use crate::error::Result;
use crate::images::{ImageStore, MediaReader};
use crate::model::{BlockKind, Evidence, ReportConfig};
use crate::pdf;
use crate::templates::{RenderContext, Strategy, Template};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Pdf,
    Docx,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Docx => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "application/pdf",
            ReportFormat::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        }
    }
}

/// Every media reference a render may draw, in first-use order.
pub fn media_references<'a>(evidence: &'a [Evidence], config: &'a ReportConfig) -> Vec<&'a str> {
    let mut refs: Vec<&str> = config.cover_logos();
    if let Some(logo) = config.logo.as_deref() {
        refs.push(logo);
    }
    if let Some(template) = &config.custom_template {
        for block in template.pages.iter().flat_map(|p| &p.blocks) {
            match &block.kind {
                BlockKind::Header(header) => refs.extend(header.logo.as_deref()),
                BlockKind::Logo(logo) => refs.extend(logo.src.as_deref()),
                _ => {}
            }
        }
    }
    refs.extend(evidence.iter().filter_map(|e| e.image.as_deref()));
    refs
}

/// Renders the configured template onto a new canvas.
pub fn compose(evidence: &[Evidence], config: &ReportConfig, images: &ImageStore) -> Result<Canvas> {
    let mut strategy = Strategy::for_config(config)?;
    debug!(template = ?strategy.kind(), items = evidence.len(), "composing report");

    let mut ctx = RenderContext::new(config, images);
    strategy.render_cover(&mut ctx);
    strategy.render_content(&mut ctx, evidence);
    Ok(ctx.finish())
}

/// PDF bytes for the given evidence. Also backs the live preview.
pub async fn generate_pdf(evidence: &[Evidence], config: &ReportConfig, reader: &dyn MediaReader) -> Result<Vec<u8>> {
    let images = ImageStore::preload(media_references(evidence, config), reader).await;
    let canvas = compose(evidence, config, &images)?;
    let bytes = pdf::render(&canvas, &config.title)?;
    info!(pages = canvas.page_count(), bytes = bytes.len(), "PDF generated");
    Ok(bytes)
}

/// Full export: the author is stamped onto the configuration, then the
/// requested encoding is produced.
pub async fn generate(
    evidence: &[Evidence],
    author: &str,
    format: ReportFormat,
    config: &ReportConfig,
    reader: &dyn MediaReader,
) -> Result<Vec<u8>> {
    let mut config = config.clone();
    if !author.trim().is_empty() {
        config.author = author.to_string();
    }

    match format {
        ReportFormat::Pdf => generate_pdf(evidence, &config, reader).await,
        ReportFormat::Docx => {
            let refs: Vec<&str> = evidence.iter().filter_map(|e| e.image.as_deref()).collect();
            let images = ImageStore::preload(refs, reader).await;
            let bytes = docx::render(evidence, &config, &images)?;
            info!(bytes = bytes.len(), "DOCX generated");
            Ok(bytes)
        }
    }
}

/// `report-title-2026-03-01.pdf` style file name.
pub fn file_name(config: &ReportConfig, date: &str, format: ReportFormat) -> String {
    let mut slug = String::new();
    for c in config.title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { "report" } else { slug };
    format!("{}-{}.{}", slug, date, format.extension())
}

// ============================================================================
// EXPORT
// ============================================================================

/// Destination for finished report bytes.
#[async_trait]
pub trait ByteSink: Send + Sync {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes reports into one directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct FsByteSink {
    dir: PathBuf,
}

impl FsByteSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FsByteSink { dir: dir.into() }
    }
}

#[async_trait]
impl ByteSink for FsByteSink {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        // Only the final component is kept so a name cannot escape `dir`.
        let name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "report".into());
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

pub async fn export(bytes: &[u8], file_name: &str, sink: &dyn ByteSink) -> Result<PathBuf> {
    let path = sink.save(file_name, bytes).await?;
    info!(path = %path.display(), "report saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::images::{DefaultMediaReader, LoadedImage};
    use crate::model::{Block, CustomTemplate, EvidenceStatus, HeaderContent, LogoContent, Page};
    use base64::Engine;

    fn png_data_uri(width: u32, height: u32) -> String {
        let png = LoadedImage::blank(width, height).to_png().unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        )
    }

    fn evidence() -> Vec<Evidence> {
        vec![
            Evidence {
                id: "1".into(),
                image: Some(png_data_uri(16, 8)),
                title: "Open login page".into(),
                description: "The login form renders".into(),
                status: EvidenceStatus::Success,
                metadata: None,
            },
            Evidence {
                id: "2".into(),
                image: Some("missing/screenshot.png".into()),
                title: "Submit bad password".into(),
                description: String::new(),
                status: EvidenceStatus::Failure,
                metadata: None,
            },
        ]
    }

    fn reader() -> DefaultMediaReader {
        DefaultMediaReader::new(std::env::temp_dir().join("proofsheet-no-media"), false)
    }

    #[test]
    fn test_media_references_cover_logos_blocks_and_evidence() {
        let config = ReportConfig {
            show_logo: true,
            logo: Some("logo.png".into()),
            custom_template: Some(CustomTemplate {
                pages: vec![Page {
                    blocks: vec![
                        Block::new(BlockKind::Header(HeaderContent {
                            logo: Some("header.png".into()),
                            ..Default::default()
                        })),
                        Block::new(BlockKind::Logo(LogoContent {
                            src: Some("block.png".into()),
                            ..Default::default()
                        })),
                    ],
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        };
        let evidence = evidence();
        let refs = media_references(&evidence, &config);
        assert_eq!(&refs[..4], &["logo.png", "logo.png", "header.png", "block.png"]);
        assert_eq!(refs.len(), 6);
    }

    #[test]
    fn test_compose_selects_template() {
        let config = ReportConfig {
            template_id: Some("creative".into()),
            ..Default::default()
        };
        let canvas = compose(&evidence(), &config, &ImageStore::new()).unwrap();
        // Cover plus one page per item.
        assert_eq!(canvas.page_count(), 3);
    }

    #[test]
    fn test_compose_rejects_custom_without_template() {
        let config = ReportConfig {
            template_id: Some("custom".into()),
            ..Default::default()
        };
        let err = compose(&evidence(), &config, &ImageStore::new()).unwrap_err();
        assert!(matches!(err, ReportError::MissingCustomTemplate));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_generate_pdf_survives_missing_media() {
        let bytes = generate(&evidence(), "Robin", ReportFormat::Pdf, &ReportConfig::default(), &reader())
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_generate_docx_is_a_zip() {
        let bytes = generate(&evidence(), "Robin", ReportFormat::Docx, &ReportConfig::default(), &reader())
            .await
            .unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_file_name_slug() {
        let config = ReportConfig {
            title: "Sprint 12: Login / Checkout!".into(),
            ..Default::default()
        };
        assert_eq!(
            file_name(&config, "2026-03-01", ReportFormat::Docx),
            "sprint-12-login-checkout-2026-03-01.docx"
        );
        let untitled = ReportConfig {
            title: "***".into(),
            ..Default::default()
        };
        assert_eq!(file_name(&untitled, "2026-03-01", ReportFormat::Pdf), "report-2026-03-01.pdf");
    }

    #[tokio::test]
    async fn test_export_writes_into_sink_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsByteSink::new(dir.path().join("out"));
        let path = export(b"%PDF-1.3", "../escape.pdf", &sink).await.unwrap();
        assert_eq!(path, dir.path().join("out").join("escape.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.3");
    }
}
