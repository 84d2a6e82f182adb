//! Modern layout: sidebar cover and evidence drawn as cards.

use super::{RenderContext, Template};
use crate::canvas::PaintMode;
use crate::font_metrics::{line_height_mm, Font};
use crate::geometry::{Color, BOTTOM_MARGIN, CONTENT_WIDTH, MARGIN_X, PAGE_HEIGHT, PAGE_WIDTH};
use crate::model::Evidence;
use crate::style;

const SIDEBAR_WIDTH: f32 = 70.0;
const CARD_PADDING: f32 = 6.0;
const CARD_GAP: f32 = 8.0;
const MAX_IMAGE_HEIGHT: f32 = 100.0;

#[derive(Debug, Default)]
pub struct Modern {
    cursor: f32,
    page_top: f32,
}

struct Card {
    description_h: f32,
    image: Option<(f32, f32)>,
    caption: Option<String>,
}

impl Card {
    fn height(&self) -> f32 {
        let mut h = CARD_PADDING + 16.0;
        if self.caption.is_some() {
            h += 5.0;
        }
        if self.description_h > 0.0 {
            h += self.description_h + 3.0;
        }
        if let Some((_, image_h)) = self.image {
            h += image_h + 3.0;
        }
        h + CARD_PADDING
    }
}

impl Modern {
    fn inner_width() -> f32 {
        CONTENT_WIDTH - 2.0 * CARD_PADDING - 3.0
    }

    fn continuation_page(&mut self, ctx: &mut RenderContext<'_>) {
        ctx.canvas.add_page();
        let primary = ctx.palette.primary;
        ctx.canvas.set_fill_color(primary);
        ctx.canvas.rect(0.0, 0.0, PAGE_WIDTH, 6.0, PaintMode::Fill);
        self.cursor = 16.0;
        self.page_top = self.cursor;
    }

    fn measure(ctx: &RenderContext<'_>, item: &Evidence) -> Card {
        let inner_w = Self::inner_width();
        Card {
            description_h: if item.description.trim().is_empty() {
                0.0
            } else {
                ctx.paragraph_height(inner_w, &item.description, Font::Regular, 10.0)
            },
            image: item
                .image
                .as_deref()
                .map(|image| ctx.image_size(image, inner_w, MAX_IMAGE_HEIGHT)),
            caption: item.metadata.as_ref().and_then(|m| m.caption()),
        }
    }

    fn card(&mut self, ctx: &mut RenderContext<'_>, index: usize, item: &Evidence, card: &Card) {
        let palette = ctx.palette;
        let inner_x = MARGIN_X + 3.0 + CARD_PADDING;
        let inner_w = Self::inner_width();
        let top = self.cursor;
        let height = card.height();

        ctx.canvas.set_fill_color(palette.background_light);
        ctx.canvas.rect(MARGIN_X, top, CONTENT_WIDTH, height, PaintMode::Fill);
        ctx.canvas.set_fill_color(palette.primary);
        ctx.canvas.rect(MARGIN_X, top, 3.0, height, PaintMode::Fill);

        let mut y = top + CARD_PADDING;
        ctx.text(inner_x, y, &format!("STEP {:02}", index + 1), Font::Bold, 8.0, palette.secondary);
        let badge_x = MARGIN_X + CONTENT_WIDTH - CARD_PADDING - ctx.badge_width(item.status);
        ctx.status_badge(badge_x, y, item.status);
        ctx.text(inner_x, y + 5.0, &item.title, Font::Bold, 13.0, palette.text);
        y += 16.0;

        if let Some(caption) = &card.caption {
            ctx.text(inner_x, y, caption, Font::Italic, 8.0, palette.text_light);
            y += 5.0;
        }
        if card.description_h > 0.0 {
            y = ctx.paragraph(inner_x, y, inner_w, &item.description, Font::Regular, 10.0, palette.text) + 3.0;
        }
        if let (Some(image), Some((w, h))) = (item.image.as_deref(), card.image) {
            ctx.image_or_placeholder(image, inner_x + (inner_w - w) / 2.0, y, w, h);
        }

        self.cursor = top + height + CARD_GAP;
    }
}

impl Template for Modern {
    fn render_cover(&mut self, ctx: &mut RenderContext<'_>) {
        let palette = ctx.palette;
        let config = ctx.config;

        ctx.canvas.set_fill_color(palette.primary);
        ctx.canvas.rect(0.0, 0.0, SIDEBAR_WIDTH, PAGE_HEIGHT, PaintMode::Fill);
        ctx.canvas.set_fill_color(palette.secondary);
        ctx.canvas.circle(SIDEBAR_WIDTH, 60.0, 18.0, PaintMode::Fill);

        ctx.text(12.0, 40.0, "EVIDENCE", Font::Bold, 14.0, Color::white());
        ctx.text(12.0, 47.0, "REPORT", Font::Bold, 14.0, Color::white());
        if !config.project_name.trim().is_empty() {
            ctx.paragraph(12.0, 250.0, SIDEBAR_WIDTH - 20.0, &config.project_name, Font::Regular, 10.0, Color::white());
        }

        let text_x = SIDEBAR_WIDTH + 12.0;
        let text_w = PAGE_WIDTH - text_x - MARGIN_X;
        ctx.logo_row(20.0, 16.0);

        let title_color = style::title_color(config, &palette);
        let subtitle_color = style::subtitle_color(config, &palette);
        let mut y = ctx.paragraph(text_x, 100.0, text_w, &config.title, Font::Bold, 26.0, title_color);
        y = ctx.paragraph(text_x, y + 3.0, text_w, &config.subtitle, Font::Regular, 14.0, subtitle_color);

        let card_top = (y + 40.0).max(190.0);
        ctx.canvas.set_fill_color(palette.background_light);
        ctx.canvas.rect(text_x - 4.0, card_top, text_w + 4.0, 32.0, PaintMode::Fill);
        ctx.info_block(text_x, card_top + 6.0, palette.primary, palette.text);
    }

    fn render_content(&mut self, ctx: &mut RenderContext<'_>, evidence: &[Evidence]) {
        ctx.canvas.add_page();
        let primary = ctx.palette.primary;
        ctx.canvas.set_fill_color(primary);
        ctx.canvas.rect(0.0, 0.0, PAGE_WIDTH, 25.0, PaintMode::Fill);
        ctx.text(MARGIN_X, 25.0 / 2.0 - line_height_mm(16.0) / 2.0, "Evidence Timeline", Font::Bold, 16.0, Color::white());
        self.cursor = 35.0;
        self.page_top = self.cursor;

        for (index, item) in evidence.iter().enumerate() {
            let card = Self::measure(ctx, item);
            // A card taller than a whole page still starts at the top.
            if self.cursor + card.height() > PAGE_HEIGHT - BOTTOM_MARGIN && self.cursor > self.page_top {
                self.continuation_page(ctx);
            }
            self.card(ctx, index, item, &card);
        }
    }
}
