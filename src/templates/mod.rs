//! Report templates.
//!
//! Every template implements [`Template`]: draw a cover, then draw the
//! evidence. [`Strategy`] is the closed set of templates, picked from the
//! configuration by [`TemplateKind::select`].

mod background;
mod classic;
mod creative;
mod custom;
mod decorations;
mod modern;
mod paginator;

pub use classic::Classic;
pub use creative::Creative;
pub use custom::Custom;
pub use modern::Modern;
pub use paginator::Paginator;

use tracing::warn;

use crate::canvas::{Canvas, PaintMode};
use crate::error::{ReportError, Result};
use crate::font_metrics::{line_height_mm, wrap_text, Font};
use crate::geometry::{fit_within, Color, CONTENT_WIDTH, MARGIN_X, PAGE_HEIGHT, PAGE_WIDTH};
use crate::images::ImageStore;
use crate::model::{Evidence, EvidenceStatus, LogoAlignment, ReportConfig};
use crate::theme::{self, Palette};

/// Height of the dashed box drawn in place of an image that failed to load.
pub const PLACEHOLDER_HEIGHT: f32 = 40.0;

pub trait Template {
    fn render_cover(&mut self, ctx: &mut RenderContext<'_>);
    fn render_content(&mut self, ctx: &mut RenderContext<'_>, evidence: &[Evidence]);
}

// ============================================================================
// STRATEGY SELECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Classic,
    Modern,
    Creative,
    Custom,
}

const TEMPLATE_IDS: &[(&str, TemplateKind)] = &[
    ("classic", TemplateKind::Classic),
    ("modern", TemplateKind::Modern),
    ("creative", TemplateKind::Creative),
    ("custom", TemplateKind::Custom),
];

const LEGACY_LAYOUTS: &[(&str, TemplateKind)] = &[
    ("A", TemplateKind::Classic),
    ("B", TemplateKind::Modern),
];

impl TemplateKind {
    /// Template id first, then the legacy layout letter, then Classic.
    pub fn select(template_id: Option<&str>, layout: Option<&str>) -> TemplateKind {
        let by_id = template_id.and_then(|id| {
            TEMPLATE_IDS
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(id.trim()))
                .map(|(_, kind)| *kind)
        });
        let by_layout = || {
            layout.and_then(|l| {
                LEGACY_LAYOUTS
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(l.trim()))
                    .map(|(_, kind)| *kind)
            })
        };
        by_id.or_else(by_layout).unwrap_or(TemplateKind::Classic)
    }
}

pub enum Strategy<'a> {
    Classic(Classic),
    Modern(Modern),
    Creative(Creative),
    Custom(Custom<'a>),
}

impl<'a> Strategy<'a> {
    pub fn for_config(config: &'a ReportConfig) -> Result<Self> {
        let kind = TemplateKind::select(config.template_id.as_deref(), config.layout.as_deref());
        Ok(match kind {
            TemplateKind::Classic => Strategy::Classic(Classic::default()),
            TemplateKind::Modern => Strategy::Modern(Modern::default()),
            TemplateKind::Creative => Strategy::Creative(Creative),
            TemplateKind::Custom => {
                let template = config
                    .custom_template
                    .as_ref()
                    .ok_or(ReportError::MissingCustomTemplate)?;
                Strategy::Custom(Custom::new(template))
            }
        })
    }

    pub fn kind(&self) -> TemplateKind {
        match self {
            Strategy::Classic(_) => TemplateKind::Classic,
            Strategy::Modern(_) => TemplateKind::Modern,
            Strategy::Creative(_) => TemplateKind::Creative,
            Strategy::Custom(_) => TemplateKind::Custom,
        }
    }
}

impl Template for Strategy<'_> {
    fn render_cover(&mut self, ctx: &mut RenderContext<'_>) {
        match self {
            Strategy::Classic(t) => t.render_cover(ctx),
            Strategy::Modern(t) => t.render_cover(ctx),
            Strategy::Creative(t) => t.render_cover(ctx),
            Strategy::Custom(t) => t.render_cover(ctx),
        }
    }

    fn render_content(&mut self, ctx: &mut RenderContext<'_>, evidence: &[Evidence]) {
        match self {
            Strategy::Classic(t) => t.render_content(ctx, evidence),
            Strategy::Modern(t) => t.render_content(ctx, evidence),
            Strategy::Creative(t) => t.render_content(ctx, evidence),
            Strategy::Custom(t) => t.render_content(ctx, evidence),
        }
    }
}

// ============================================================================
// RENDER CONTEXT
// ============================================================================

/// State for one render: a fresh canvas plus read-only inputs.
pub struct RenderContext<'a> {
    pub canvas: Canvas,
    pub config: &'a ReportConfig,
    pub palette: Palette,
    pub images: &'a ImageStore,
    pub date: String,
}

impl<'a> RenderContext<'a> {
    pub fn new(config: &'a ReportConfig, images: &'a ImageStore) -> Self {
        let date = config
            .date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
        RenderContext {
            canvas: Canvas::new(PAGE_WIDTH, PAGE_HEIGHT),
            config,
            palette: theme::resolve(config.theme),
            images,
            date,
        }
    }

    pub fn finish(self) -> Canvas {
        self.canvas
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    pub fn text(&mut self, x: f32, y: f32, text: &str, font: Font, size: f32, color: Color) {
        self.canvas.set_fill_color(color);
        self.canvas.text(x, y, text, font, size);
    }

    pub fn text_centered(&mut self, y: f32, text: &str, font: Font, size: f32, color: Color) {
        let width = font.metrics().string_width_mm(text, size);
        self.text((PAGE_WIDTH - width) / 2.0, y, text, font, size, color);
    }

    pub fn text_right(&mut self, right: f32, y: f32, text: &str, font: Font, size: f32, color: Color) {
        let width = font.metrics().string_width_mm(text, size);
        self.text(right - width, y, text, font, size, color);
    }

    /// Draws `text` wrapped to `width`; returns the y below the last line.
    pub fn paragraph(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        text: &str,
        font: Font,
        size: f32,
        color: Color,
    ) -> f32 {
        let line_h = line_height_mm(size);
        let lines = wrap_text(text, size, width, font);
        self.canvas.set_fill_color(color);
        for (i, line) in lines.iter().enumerate() {
            self.canvas.text(x, y + i as f32 * line_h, line.as_str(), font, size);
        }
        y + lines.len() as f32 * line_h
    }

    /// Height `paragraph` would use, without drawing.
    pub fn paragraph_height(&self, width: f32, text: &str, font: Font, size: f32) -> f32 {
        wrap_text(text, size, width, font).len() as f32 * line_height_mm(size)
    }

    // ------------------------------------------------------------------
    // Badges and rules
    // ------------------------------------------------------------------

    pub fn badge_width(&self, status: EvidenceStatus) -> f32 {
        Font::Bold.metrics().string_width_mm(status.label(), 8.0) + 6.0
    }

    /// Status pill with its top-left corner at `(x, y)`. Returns its width.
    pub fn status_badge(&mut self, x: f32, y: f32, status: EvidenceStatus) -> f32 {
        let (background, text) = match status {
            EvidenceStatus::Success => (self.palette.success.background, self.palette.success.text),
            EvidenceStatus::Failure => (self.palette.failure.background, self.palette.failure.text),
            EvidenceStatus::Pending => (self.palette.background_light, self.palette.text_light),
        };
        let width = self.badge_width(status);
        self.canvas.set_fill_color(background);
        self.canvas.rect(x, y, width, 6.0, PaintMode::Fill);
        self.text(x + 3.0, y + 1.2, status.label(), Font::Bold, 8.0, text);
        width
    }

    pub fn rule(&mut self, x1: f32, x2: f32, y: f32, width: f32, color: Color) {
        self.canvas.set_stroke_color(color);
        self.canvas.set_line_width(width);
        self.canvas.line(x1, y, x2, y);
    }

    // ------------------------------------------------------------------
    // Images
    // ------------------------------------------------------------------

    /// Display size of an image fitted into `(max_w, max_h)`. Images that
    /// failed to load get the placeholder size.
    pub fn image_size(&self, reference: &str, max_w: f32, max_h: f32) -> (f32, f32) {
        match self.images.get(reference) {
            Some(Ok(img)) => fit_within(img.width as f32, img.height as f32, max_w, max_h),
            _ => (max_w, PLACEHOLDER_HEIGHT.min(max_h)),
        }
    }

    /// Draws the image, or a dashed placeholder when it is not available.
    pub fn image_or_placeholder(&mut self, reference: &str, x: f32, y: f32, width: f32, height: f32) {
        let images = self.images;
        match images.get(reference) {
            Some(Ok(img)) => self.canvas.image(x, y, width, height, img.clone()),
            Some(Err(e)) => {
                warn!("drawing placeholder for image: {}", e);
                self.placeholder(x, y, width, height, "Image unavailable");
            }
            None => {
                warn!("image was not preloaded, drawing placeholder");
                self.placeholder(x, y, width, height, "Image unavailable");
            }
        }
    }

    pub fn placeholder(&mut self, x: f32, y: f32, width: f32, height: f32, label: &str) {
        self.canvas.set_fill_color(Color::rgb(243, 244, 246));
        self.canvas.rect(x, y, width, height, PaintMode::Fill);
        self.canvas.set_stroke_color(Color::rgb(156, 163, 175));
        self.canvas.set_line_width(0.3);
        self.canvas.set_dash(Some((2.0, 2.0)));
        self.canvas.rect(x, y, width, height, PaintMode::Stroke);
        self.canvas.set_dash(None);

        let label_w = Font::Italic.metrics().string_width_mm(label, 9.0);
        let text_color = self.palette.text_light;
        self.text(
            x + (width - label_w) / 2.0,
            y + height / 2.0 - 1.5,
            label,
            Font::Italic,
            9.0,
            text_color,
        );
    }

    /// Cover logos in one row at `y`, laid out per the configured alignment.
    /// Returns the y below the row (unchanged when no logo is enabled).
    pub fn logo_row(&mut self, y: f32, height: f32) -> f32 {
        let config = self.config;
        let logos = config.cover_logos();
        if logos.is_empty() {
            return y;
        }

        let sizes: Vec<(f32, f32)> = logos
            .iter()
            .map(|logo| self.image_size(logo, CONTENT_WIDTH / 2.0, height))
            .collect();
        let gap = config.logo_gap.max(0.0);
        let total: f32 = sizes.iter().map(|(w, _)| w).sum::<f32>() + gap * (sizes.len() - 1) as f32;

        let positions: Vec<f32> = match config.logo_alignment {
            LogoAlignment::SpaceBetween if sizes.len() > 1 => {
                vec![MARGIN_X, MARGIN_X + CONTENT_WIDTH - sizes[sizes.len() - 1].0]
            }
            alignment => {
                let start = match alignment {
                    LogoAlignment::Center => (PAGE_WIDTH - total) / 2.0,
                    LogoAlignment::Right => MARGIN_X + CONTENT_WIDTH - total,
                    _ => MARGIN_X,
                };
                let mut x = start;
                sizes
                    .iter()
                    .map(|(w, _)| {
                        let at = x;
                        x += w + gap;
                        at
                    })
                    .collect()
            }
        };

        for ((logo, (w, h)), x) in logos.iter().zip(&sizes).zip(positions) {
            self.image_or_placeholder(logo, x, y, *w, *h);
        }
        y + height
    }

    /// Author / date / project lines. Returns the y below the block.
    pub fn info_block(&mut self, x: f32, y: f32, label_color: Color, value_color: Color) -> f32 {
        let config = self.config;
        let date = self.date.clone();
        let rows = [
            ("Author", config.author.as_str()),
            ("Date", date.as_str()),
            ("Project", config.project_name.as_str()),
        ];
        let mut y = y;
        for (label, value) in rows {
            if value.trim().is_empty() {
                continue;
            }
            self.text(x, y, &format!("{}:", label), Font::Bold, 11.0, label_color);
            self.text(x + 25.0, y, value, Font::Regular, 11.0, value_color);
            y += 7.0;
        }
        y
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::canvas::Command;

    pub fn config() -> ReportConfig {
        ReportConfig {
            author: "Robin Tester".into(),
            project_name: "Checkout".into(),
            date: Some("2026-03-01".into()),
            ..Default::default()
        }
    }

    pub fn evidence(n: usize, image: Option<&str>) -> Vec<Evidence> {
        (1..=n)
            .map(|i| Evidence {
                id: format!("ev-{}", i),
                image: image.map(str::to_string),
                title: format!("Step {}", i),
                description: String::new(),
                status: EvidenceStatus::Success,
                metadata: None,
            })
            .collect()
    }

    pub fn count(canvas: &Canvas, page: usize, pred: impl Fn(&Command) -> bool) -> usize {
        canvas.pages()[page].commands.iter().filter(|c| pred(c)).count()
    }

    pub fn has_text(canvas: &Canvas, page: usize, needle: &str) -> bool {
        canvas.pages()[page].texts().any(|(t, _, _)| t.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::canvas::Command;
    use crate::images::{ImageError, LoadedImage};

    #[test]
    fn test_select_by_id_then_legacy_layout() {
        assert_eq!(TemplateKind::select(Some("modern"), None), TemplateKind::Modern);
        assert_eq!(TemplateKind::select(Some("Creative"), Some("A")), TemplateKind::Creative);
        assert_eq!(TemplateKind::select(None, Some("B")), TemplateKind::Modern);
        assert_eq!(TemplateKind::select(Some("unheard-of"), Some("A")), TemplateKind::Classic);
        assert_eq!(TemplateKind::select(Some("unheard-of"), Some("Z")), TemplateKind::Classic);
        assert_eq!(TemplateKind::select(None, None), TemplateKind::Classic);
    }

    #[test]
    fn test_custom_without_template_is_rejected() {
        let config = ReportConfig {
            template_id: Some("custom".into()),
            ..Default::default()
        };
        assert!(matches!(
            Strategy::for_config(&config),
            Err(ReportError::MissingCustomTemplate)
        ));
    }

    #[test]
    fn test_placeholder_is_dashed() {
        let config = config();
        let mut images = ImageStore::new();
        images.insert_error("bad.png", ImageError::EmptyData);
        let mut ctx = RenderContext::new(&config, &images);

        ctx.image_or_placeholder("bad.png", 20.0, 20.0, 100.0, 40.0);
        let canvas = ctx.finish();
        assert_eq!(count(&canvas, 0, |c| matches!(c, Command::SetDash(Some(_)))), 1);
        assert_eq!(count(&canvas, 0, |c| matches!(c, Command::Image { .. })), 0);
        assert!(has_text(&canvas, 0, "Image unavailable"));
    }

    #[test]
    fn test_logo_row_alignment() {
        let mut config = config();
        config.show_logo = true;
        config.logo = Some("a.png".into());
        config.show_secondary_logo = true;
        config.secondary_logo = Some("b.png".into());
        config.logo_gap = 10.0;
        config.logo_alignment = LogoAlignment::Right;

        let mut images = ImageStore::new();
        images.insert("a.png", LoadedImage::blank(40, 20));
        images.insert("b.png", LoadedImage::blank(60, 20));
        let mut ctx = RenderContext::new(&config, &images);
        let below = ctx.logo_row(10.0, 20.0);
        assert_eq!(below, 30.0);

        let xs: Vec<f32> = ctx.canvas.pages()[0]
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::Image { x, .. } => Some(*x),
                _ => None,
            })
            .collect();
        // 40 + 60 mm wide plus a 10 mm gap, flush with the right margin.
        assert_eq!(xs, vec![80.0, 130.0]);
    }

    #[test]
    fn test_paragraph_advances_by_line_count() {
        let config = config();
        let images = ImageStore::new();
        let mut ctx = RenderContext::new(&config, &images);
        let end = ctx.paragraph(20.0, 50.0, 170.0, "one\ntwo\nthree", Font::Regular, 10.0, Color::black());
        assert!((end - (50.0 + 3.0 * line_height_mm(10.0))).abs() < 1e-4);
    }
}
