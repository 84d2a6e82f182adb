//! Dynamic block interpreter.
//!
//! Walks the authored pages of a [`CustomTemplate`] block by block, keeping
//! a vertical cursor. Content that would start below the bottom limit moves
//! to a fresh physical page, and every fresh page gets the template's
//! background and decorations painted first.

use tracing::{debug, warn};

use super::paginator::Paginator;
use super::{background, decorations, RenderContext, Template};
use crate::canvas::PaintMode;
use crate::font_metrics::{line_height_mm, Font};
use crate::geometry::{builder_px_to_mm, Color, BLOCK_GAP, CONTENT_WIDTH, MARGIN_X, PAGE_WIDTH};
use crate::model::{
    Alignment, Block, BlockKind, CustomTemplate, Evidence, EvidenceLayout, EvidenceLoopContent, HeaderContent,
    HeaderVariant, LogoContent, OverlayScope, TableContent, TextContent,
};
use crate::style;

const TITLE_ROW: f32 = 10.0;
const CAPTION_ROW: f32 = 5.0;
const IMAGE_GAP: f32 = 5.0;
const ITEM_GAP: f32 = 10.0;
const SPLIT_IMAGE_WIDTH: f32 = 80.0;
const SPLIT_GUTTER: f32 = 5.0;
const DEFAULT_MAX_IMAGE_HEIGHT: f32 = 100.0;
const TABLE_ROW_HEIGHT: f32 = 10.0;
const GRID_HEIGHT: f32 = 60.0;
const LOGO_PLACEHOLDER_HEIGHT: f32 = 20.0;
const BODY_SIZE: f32 = 11.0;
const DESCRIPTION_SIZE: f32 = 10.0;

pub struct Custom<'a> {
    template: &'a CustomTemplate,
    pager: Paginator,
}

impl<'a> Custom<'a> {
    pub fn new(template: &'a CustomTemplate) -> Self {
        Custom {
            template,
            pager: Paginator::default(),
        }
    }

    fn overlay(&self, ctx: &mut RenderContext<'_>) {
        background::draw(&mut ctx.canvas, &self.template.background, &ctx.palette);
        decorations::draw(
            &mut ctx.canvas,
            &self.template.decorations,
            &self.template.settings,
            &ctx.palette,
        );
    }

    fn new_page(&mut self, ctx: &mut RenderContext<'_>) {
        ctx.canvas.add_page();
        if self.template.settings.overlay_scope == OverlayScope::EveryPage {
            self.overlay(ctx);
        }
        self.pager.reset();
        debug!(page = ctx.canvas.page_count(), "started page");
    }

    fn render_block(&mut self, ctx: &mut RenderContext<'_>, block: &Block, evidence: &[Evidence]) {
        match &block.kind {
            BlockKind::PageBreak => {
                self.new_page(ctx);
                return;
            }
            BlockKind::Unknown(tag) => {
                warn!(tag = %tag, "skipping block of unknown type");
                return;
            }
            // Footers stay on the page they close.
            BlockKind::Footer(_) => {}
            _ => {
                if self.pager.needs_break() {
                    self.new_page(ctx);
                }
            }
        }

        let start = self.pager.cursor();
        let start_page = ctx.canvas.current_page();

        let end = match &block.kind {
            BlockKind::Header(content) => self.header(ctx, content, block.settings.variant, start),
            BlockKind::Footer(content) => self.footer(ctx, content, start),
            BlockKind::Text(content) => self.text(ctx, content, start),
            BlockKind::Summary(content) => self.captioned(ctx, content, "Summary", start),
            BlockKind::Conclusion(content) => self.captioned(ctx, content, "Conclusion", start),
            BlockKind::Toc(content) => self.toc(ctx, content, start),
            BlockKind::Logo(content) => self.logo(ctx, content, start),
            BlockKind::Table(content) => self.table(ctx, *content, start),
            BlockKind::Grid => self.grid(ctx, start),
            BlockKind::EvidenceLoop(content) => self.evidence_loop(ctx, content, evidence),
            BlockKind::PageBreak | BlockKind::Unknown(_) => start,
        };
        self.pager.advance_to(end);

        if block.settings.show_border {
            // A block that spilled onto later pages is framed on its last page only.
            let top = if ctx.canvas.current_page() == start_page {
                start
            } else {
                self.pager.top()
            };
            self.border(ctx, block, top, self.pager.cursor());
        }

        self.pager.advance(BLOCK_GAP);
    }

    fn border(&self, ctx: &mut RenderContext<'_>, block: &Block, top: f32, bottom: f32) {
        let width = style::block_border_width(&block.settings, &self.template.settings);
        if width <= 0.0 {
            return;
        }
        let color = style::block_border_color(&block.settings, &self.template.settings, &ctx.palette);
        ctx.canvas.set_stroke_color(color);
        ctx.canvas.set_line_width(width);
        ctx.canvas.rect(
            MARGIN_X - 2.0,
            top - 2.0,
            CONTENT_WIDTH + 4.0,
            bottom - top + 4.0,
            PaintMode::Stroke,
        );
    }

    // ------------------------------------------------------------------
    // Block renderers. Each draws at `y` and returns where it ended.
    // ------------------------------------------------------------------

    fn header(&self, ctx: &mut RenderContext<'_>, content: &HeaderContent, variant: HeaderVariant, y: f32) -> f32 {
        let config = ctx.config;
        let logo = if content.show_logo {
            content.logo.as_deref().or(config.logo.as_deref())
        } else {
            None
        };
        let title = if content.title.trim().is_empty() {
            config.title.as_str()
        } else {
            content.title.as_str()
        };
        let subtitle = content.subtitle.as_deref().filter(|s| !s.trim().is_empty());
        let logo_size = logo.map(|l| ctx.image_size(l, 40.0, 15.0));
        let text_width = CONTENT_WIDTH - logo_size.map_or(0.0, |(w, _)| w + 5.0);

        match variant {
            HeaderVariant::Classic => {
                if let (Some(logo), Some((w, h))) = (logo, logo_size) {
                    ctx.image_or_placeholder(logo, MARGIN_X + CONTENT_WIDTH - w, y, w, h);
                }
                let text = ctx.palette.text;
                let light = ctx.palette.text_light;
                let mut end = ctx.paragraph(MARGIN_X, y, text_width, title, Font::Bold, 22.0, text);
                if let Some(subtitle) = subtitle {
                    end = ctx.paragraph(MARGIN_X, end, text_width, subtitle, Font::Regular, 12.0, light);
                }
                if let Some((_, h)) = logo_size {
                    end = end.max(y + h);
                }
                let rule_y = end + 2.0;
                let primary = ctx.palette.primary;
                ctx.rule(MARGIN_X, MARGIN_X + CONTENT_WIDTH, rule_y, 0.8, primary);
                rule_y + 2.0
            }
            HeaderVariant::Modern => {
                let title_h = ctx.paragraph_height(text_width, title, Font::Bold, 20.0);
                let subtitle_h = subtitle.map_or(0.0, |s| ctx.paragraph_height(text_width, s, Font::Regular, 11.0) + 1.0);
                let band_h = (10.0 + title_h + subtitle_h).max(logo_size.map_or(0.0, |(_, h)| h + 10.0));

                let primary = ctx.palette.primary;
                ctx.canvas.set_fill_color(primary);
                ctx.canvas.rect(0.0, y, PAGE_WIDTH, band_h, PaintMode::Fill);

                let end = ctx.paragraph(MARGIN_X, y + 5.0, text_width, title, Font::Bold, 20.0, Color::white());
                if let Some(subtitle) = subtitle {
                    ctx.paragraph(MARGIN_X, end + 1.0, text_width, subtitle, Font::Regular, 11.0, Color::white());
                }
                if let (Some(logo), Some((w, h))) = (logo, logo_size) {
                    ctx.image_or_placeholder(logo, MARGIN_X + CONTENT_WIDTH - w, y + (band_h - h) / 2.0, w, h);
                }
                y + band_h
            }
        }
    }

    fn footer(&self, ctx: &mut RenderContext<'_>, content: &TextContent, y: f32) -> f32 {
        let light = ctx.palette.text_light;
        ctx.rule(MARGIN_X, MARGIN_X + CONTENT_WIDTH, y, 0.3, light);
        let caption = if content.text.trim().is_empty() {
            format!("{} - {}", ctx.config.title, ctx.date)
        } else {
            content.text.clone()
        };
        ctx.text_centered(y + 2.0, &caption, Font::Regular, 9.0, light);
        y + 2.0 + line_height_mm(9.0)
    }

    fn text(&self, ctx: &mut RenderContext<'_>, content: &TextContent, y: f32) -> f32 {
        let mut y = y;
        if let Some(title) = content.title.as_deref().filter(|t| !t.trim().is_empty()) {
            let primary = ctx.palette.primary;
            y = ctx.paragraph(MARGIN_X, y, CONTENT_WIDTH, title, Font::Bold, 13.0, primary) + 1.0;
        }
        let color = ctx.palette.text;
        ctx.paragraph(MARGIN_X, y, CONTENT_WIDTH, &content.text, Font::Regular, BODY_SIZE, color)
    }

    fn captioned(&self, ctx: &mut RenderContext<'_>, content: &TextContent, default_title: &str, y: f32) -> f32 {
        let title = content
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(default_title);
        let primary = ctx.palette.primary;
        let text = ctx.palette.text;
        let y = ctx.paragraph(MARGIN_X, y, CONTENT_WIDTH, title, Font::Bold, 14.0, primary) + 2.0;
        ctx.paragraph(MARGIN_X, y, CONTENT_WIDTH, &content.text, Font::Regular, BODY_SIZE, text)
    }

    fn toc(&self, ctx: &mut RenderContext<'_>, content: &TextContent, y: f32) -> f32 {
        const ENTRIES: [(&str, &str); 3] = [("1. Overview", "2"), ("2. Evidence", "3"), ("3. Conclusion", "4")];

        let title = content
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Table of Contents");
        let primary = ctx.palette.primary;
        let text = ctx.palette.text;
        let light = ctx.palette.text_light;
        let mut y = ctx.paragraph(MARGIN_X, y, CONTENT_WIDTH, title, Font::Bold, 14.0, primary) + 3.0;

        let right = MARGIN_X + CONTENT_WIDTH;
        for (label, page) in ENTRIES {
            ctx.text(MARGIN_X, y, label, Font::Regular, BODY_SIZE, text);
            ctx.text_right(right, y, page, Font::Regular, BODY_SIZE, text);

            let label_end = MARGIN_X + Font::Regular.metrics().string_width_mm(label, BODY_SIZE) + 2.0;
            let number_start = right - Font::Regular.metrics().string_width_mm(page, BODY_SIZE) - 2.0;
            let leader_y = y + line_height_mm(BODY_SIZE) * 0.7;
            ctx.canvas.set_dash(Some((0.5, 1.0)));
            ctx.rule(label_end, number_start, leader_y, 0.2, light);
            ctx.canvas.set_dash(None);
            y += 7.0;
        }
        y
    }

    fn logo(&self, ctx: &mut RenderContext<'_>, content: &LogoContent, y: f32) -> f32 {
        let width = builder_px_to_mm(content.width);
        let x = match content.alignment {
            Alignment::Left => MARGIN_X,
            Alignment::Center => (PAGE_WIDTH - width) / 2.0,
            Alignment::Right => MARGIN_X + CONTENT_WIDTH - width,
        };
        let src = content.src.as_deref().filter(|s| !s.is_empty());
        let height = match src.and_then(|s| ctx.images.get(s)) {
            Some(Ok(img)) if img.width > 0 => width * img.height as f32 / img.width as f32,
            _ => LOGO_PLACEHOLDER_HEIGHT,
        };

        match src {
            Some(src) => ctx.image_or_placeholder(src, x, y, width, height),
            None => ctx.placeholder(x, y, width, height, "Logo"),
        }
        y + height
    }

    fn table(&self, ctx: &mut RenderContext<'_>, content: TableContent, y: f32) -> f32 {
        let cols = content.cols.max(1);
        let cell_w = CONTENT_WIDTH / cols as f32;
        let light = ctx.palette.text_light;

        ctx.canvas.set_stroke_color(light);
        ctx.canvas.set_line_width(0.2);
        for row in 0..content.rows {
            for col in 0..cols {
                ctx.canvas.rect(
                    MARGIN_X + col as f32 * cell_w,
                    y + row as f32 * TABLE_ROW_HEIGHT,
                    cell_w,
                    TABLE_ROW_HEIGHT,
                    PaintMode::Stroke,
                );
            }
        }
        y + content.rows as f32 * TABLE_ROW_HEIGHT
    }

    fn grid(&self, ctx: &mut RenderContext<'_>, y: f32) -> f32 {
        let gap = 4.0;
        let cell_w = (CONTENT_WIDTH - gap) / 2.0;
        let cell_h = (GRID_HEIGHT - gap) / 2.0;
        let fill = ctx.palette.background_light;
        let light = ctx.palette.text_light;

        for row in 0..2 {
            for col in 0..2 {
                let x = MARGIN_X + col as f32 * (cell_w + gap);
                let top = y + row as f32 * (cell_h + gap);
                ctx.canvas.set_fill_color(fill);
                ctx.canvas.set_stroke_color(light);
                ctx.canvas.set_line_width(0.2);
                ctx.canvas.rect(x, top, cell_w, cell_h, PaintMode::FillStroke);
                let label_w = Font::Italic.metrics().string_width_mm("Image", 9.0);
                ctx.text(x + (cell_w - label_w) / 2.0, top + cell_h / 2.0 - 1.5, "Image", Font::Italic, 9.0, light);
            }
        }
        y + GRID_HEIGHT
    }

    // ------------------------------------------------------------------
    // Evidence loop
    // ------------------------------------------------------------------

    fn evidence_loop(&mut self, ctx: &mut RenderContext<'_>, content: &EvidenceLoopContent, evidence: &[Evidence]) -> f32 {
        if evidence.is_empty() {
            let light = ctx.palette.text_light;
            let y = self.pager.cursor();
            ctx.text(MARGIN_X, y, "No evidence captured.", Font::Italic, BODY_SIZE, light);
            return y + line_height_mm(BODY_SIZE);
        }

        for (index, item) in evidence.iter().enumerate() {
            let height = self.item_height(ctx, content, item);
            if !self.pager.fits(height) && !self.pager.at_top() {
                self.new_page(ctx);
            }
            let end = self.evidence_item(ctx, content, index, item, self.pager.cursor());
            self.pager.advance_to(end);
            if index + 1 < evidence.len() {
                self.pager.advance(ITEM_GAP);
            }
        }
        self.pager.cursor()
    }

    /// Tallest image an item may carry: the configured maximum, cut down so
    /// title, caption and image always fit between the top margin and the
    /// bottom limit.
    fn image_cap(&self, content: &EvidenceLoopContent, item: &Evidence) -> f32 {
        let caption_h = if caption(item).is_some() { CAPTION_ROW } else { 0.0 };
        let band = self.pager.limit() - self.pager.top() - TITLE_ROW - caption_h - IMAGE_GAP;
        max_image_height(content).min(band).max(0.0)
    }

    fn item_height(&self, ctx: &RenderContext<'_>, content: &EvidenceLoopContent, item: &Evidence) -> f32 {
        let max_h = self.image_cap(content, item);
        let mut height = TITLE_ROW;
        if caption(item).is_some() {
            height += CAPTION_ROW;
        }
        let description = description(content, item);

        match content.layout {
            EvidenceLayout::TopBottom => {
                if let Some(image) = item.image.as_deref() {
                    height += ctx.image_size(image, CONTENT_WIDTH, max_h).1 + IMAGE_GAP;
                }
                if let Some(text) = description {
                    height += ctx.paragraph_height(CONTENT_WIDTH, text, Font::Regular, DESCRIPTION_SIZE);
                }
            }
            EvidenceLayout::SplitLeft | EvidenceLayout::SplitRight => {
                let image_h = item
                    .image
                    .as_deref()
                    .map_or(0.0, |image| ctx.image_size(image, SPLIT_IMAGE_WIDTH, max_h).1);
                let text_h = description.map_or(0.0, |text| {
                    ctx.paragraph_height(split_text_width(), text, Font::Regular, DESCRIPTION_SIZE)
                });
                let body = image_h.max(text_h);
                if body > 0.0 {
                    height += body + IMAGE_GAP;
                }
            }
        }
        height
    }

    fn evidence_item(
        &self,
        ctx: &mut RenderContext<'_>,
        content: &EvidenceLoopContent,
        index: usize,
        item: &Evidence,
        y: f32,
    ) -> f32 {
        let text = ctx.palette.text;
        let light = ctx.palette.text_light;
        let max_h = self.image_cap(content, item);

        let badge_x = MARGIN_X + CONTENT_WIDTH - ctx.badge_width(item.status);
        ctx.status_badge(badge_x, y, item.status);
        ctx.text(MARGIN_X, y, &format!("{}. {}", index + 1, item.title), Font::Bold, 12.0, text);
        let mut y = y + TITLE_ROW;

        if let Some(caption) = caption(item) {
            ctx.text(MARGIN_X, y, &caption, Font::Italic, 8.0, light);
            y += CAPTION_ROW;
        }

        let description = description(content, item);
        match content.layout {
            EvidenceLayout::TopBottom => {
                if let Some(image) = item.image.as_deref() {
                    let (w, h) = ctx.image_size(image, CONTENT_WIDTH, max_h);
                    ctx.image_or_placeholder(image, MARGIN_X + (CONTENT_WIDTH - w) / 2.0, y, w, h);
                    y += h + IMAGE_GAP;
                }
                if let Some(description) = description {
                    y = ctx.paragraph(MARGIN_X, y, CONTENT_WIDTH, description, Font::Regular, DESCRIPTION_SIZE, text);
                }
                y
            }
            EvidenceLayout::SplitLeft | EvidenceLayout::SplitRight => {
                let (image_x, text_x) = if content.layout == EvidenceLayout::SplitLeft {
                    (MARGIN_X, MARGIN_X + SPLIT_IMAGE_WIDTH + SPLIT_GUTTER)
                } else {
                    (MARGIN_X + split_text_width() + SPLIT_GUTTER, MARGIN_X)
                };

                let mut body = 0.0f32;
                if let Some(image) = item.image.as_deref() {
                    let (w, h) = ctx.image_size(image, SPLIT_IMAGE_WIDTH, max_h);
                    ctx.image_or_placeholder(image, image_x + (SPLIT_IMAGE_WIDTH - w) / 2.0, y, w, h);
                    body = body.max(h);
                }
                if let Some(description) = description {
                    let end = ctx.paragraph(text_x, y, split_text_width(), description, Font::Regular, DESCRIPTION_SIZE, text);
                    body = body.max(end - y);
                }
                if body > 0.0 {
                    y += body + IMAGE_GAP;
                }
                y
            }
        }
    }
}

fn max_image_height(content: &EvidenceLoopContent) -> f32 {
    if content.max_image_height > 0.0 {
        content.max_image_height
    } else {
        DEFAULT_MAX_IMAGE_HEIGHT
    }
}

fn split_text_width() -> f32 {
    CONTENT_WIDTH - SPLIT_IMAGE_WIDTH - SPLIT_GUTTER
}

fn caption(item: &Evidence) -> Option<String> {
    item.metadata.as_ref().and_then(|m| m.caption())
}

fn description<'e>(content: &EvidenceLoopContent, item: &'e Evidence) -> Option<&'e str> {
    Some(item.description.as_str()).filter(|d| content.show_description && !d.trim().is_empty())
}

impl Template for Custom<'_> {
    /// The first page carries the overlay under every scope.
    fn render_cover(&mut self, ctx: &mut RenderContext<'_>) {
        self.overlay(ctx);
    }

    fn render_content(&mut self, ctx: &mut RenderContext<'_>, evidence: &[Evidence]) {
        let template = self.template;
        for (index, page) in template.pages.iter().enumerate() {
            // Each authored page after the first starts on a fresh sheet.
            if index > 0 {
                self.new_page(ctx);
            }
            for block in &page.blocks {
                self.render_block(ctx, block, evidence);
            }
        }
        debug!(pages = ctx.canvas.page_count(), "custom template rendered");
    }
}
