//! Classic layout: banded cover, then a single column of numbered steps.

use super::{RenderContext, Template};
use crate::canvas::PaintMode;
use crate::font_metrics::{line_height_mm, Font};
use crate::geometry::{Color, CONTENT_WIDTH, MARGIN_X, PAGE_HEIGHT, PAGE_WIDTH, TOP_MARGIN};
use crate::model::Evidence;
use crate::style;

/// A step starts on a new page once fewer than this many mm remain.
const BREAK_MARGIN: f32 = 80.0;
const MAX_IMAGE_HEIGHT: f32 = 110.0;
const BOTTOM_LIMIT: f32 = PAGE_HEIGHT - 20.0;

#[derive(Debug, Default)]
pub struct Classic {
    cursor: f32,
}

impl Classic {
    fn new_page(&mut self, ctx: &mut RenderContext<'_>) {
        ctx.canvas.add_page();
        let primary = ctx.palette.primary;
        ctx.canvas.set_fill_color(primary);
        ctx.canvas.rect(0.0, 0.0, PAGE_WIDTH, 4.0, PaintMode::Fill);
        self.cursor = TOP_MARGIN;
    }

    fn step(&mut self, ctx: &mut RenderContext<'_>, index: usize, item: &Evidence) {
        let palette = ctx.palette;
        let y = self.cursor;

        // Numbered step indicator.
        ctx.canvas.set_fill_color(palette.primary);
        ctx.canvas.circle(MARGIN_X + 4.0, y + 4.0, 4.0, PaintMode::Fill);
        let number = (index + 1).to_string();
        let number_w = Font::Bold.metrics().string_width_mm(&number, 10.0);
        ctx.text(MARGIN_X + 4.0 - number_w / 2.0, y + 2.2, &number, Font::Bold, 10.0, Color::white());

        let badge_x = MARGIN_X + CONTENT_WIDTH - ctx.badge_width(item.status);
        ctx.status_badge(badge_x, y + 1.0, item.status);
        let title_w = badge_x - (MARGIN_X + 12.0) - 4.0;
        let mut y = ctx.paragraph(MARGIN_X + 12.0, y + 1.0, title_w, &item.title, Font::Bold, 13.0, palette.text);
        y = y.max(self.cursor + 10.0);

        if let Some(caption) = item.metadata.as_ref().and_then(|m| m.caption()) {
            ctx.text(MARGIN_X + 12.0, y, &caption, Font::Italic, 8.0, palette.text_light);
            y += 5.0;
        }

        if !item.description.trim().is_empty() {
            y = ctx.paragraph(MARGIN_X, y + 1.0, CONTENT_WIDTH, &item.description, Font::Regular, 10.0, palette.text) + 3.0;
        }

        if let Some(image) = item.image.as_deref() {
            let (w, h) = ctx.image_size(image, CONTENT_WIDTH, MAX_IMAGE_HEIGHT);
            if y + h > BOTTOM_LIMIT {
                self.new_page(ctx);
                y = self.cursor;
            }
            ctx.image_or_placeholder(image, MARGIN_X + (CONTENT_WIDTH - w) / 2.0, y, w, h);
            y += h + 5.0;
        }

        ctx.rule(MARGIN_X, MARGIN_X + CONTENT_WIDTH, y, 0.2, palette.background_light);
        self.cursor = y + 8.0;
    }
}

impl Template for Classic {
    fn render_cover(&mut self, ctx: &mut RenderContext<'_>) {
        let palette = ctx.palette;
        let config = ctx.config;

        ctx.canvas.set_fill_color(palette.primary);
        ctx.canvas.rect(0.0, 0.0, PAGE_WIDTH, 12.0, PaintMode::Fill);
        ctx.canvas.set_fill_color(palette.secondary);
        ctx.canvas.rect(0.0, 12.0, PAGE_WIDTH, 3.0, PaintMode::Fill);

        ctx.logo_row(28.0, 18.0);

        let title_color = style::title_color(config, &palette);
        let subtitle_color = style::subtitle_color(config, &palette);
        let mut y = ctx.paragraph(MARGIN_X, 95.0, CONTENT_WIDTH, &config.title, Font::Bold, 28.0, title_color);
        y = ctx.paragraph(MARGIN_X, y + 3.0, CONTENT_WIDTH, &config.subtitle, Font::Regular, 16.0, subtitle_color);

        ctx.canvas.set_fill_color(palette.primary);
        ctx.canvas.rect(MARGIN_X, y + 6.0, 40.0, 1.5, PaintMode::Fill);

        ctx.info_block(MARGIN_X, 200.0, palette.text, palette.text_light);

        ctx.canvas.set_fill_color(palette.primary);
        ctx.canvas.rect(0.0, PAGE_HEIGHT - 10.0, PAGE_WIDTH, 10.0, PaintMode::Fill);
    }

    fn render_content(&mut self, ctx: &mut RenderContext<'_>, evidence: &[Evidence]) {
        self.new_page(ctx);
        let primary = ctx.palette.primary;
        ctx.text(MARGIN_X, self.cursor, "Test Evidence", Font::Bold, 18.0, primary);
        self.cursor += line_height_mm(18.0) + 2.0;
        ctx.rule(MARGIN_X, MARGIN_X + CONTENT_WIDTH, self.cursor, 0.5, primary);
        self.cursor += 8.0;

        for (index, item) in evidence.iter().enumerate() {
            if self.cursor > PAGE_HEIGHT - BREAK_MARGIN {
                self.new_page(ctx);
            }
            self.step(ctx, index, item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::canvas::Command;
    use crate::images::{ImageStore, LoadedImage};

    fn render(evidence: &[Evidence], images: &ImageStore) -> crate::canvas::Canvas {
        let config = config();
        let mut ctx = RenderContext::new(&config, images);
        let mut classic = Classic::default();
        classic.render_cover(&mut ctx);
        classic.render_content(&mut ctx, evidence);
        ctx.finish()
    }

    #[test]
    fn test_cover_carries_title_and_info() {
        let canvas = render(&[], &ImageStore::new());
        assert_eq!(canvas.page_count(), 2);
        assert!(has_text(&canvas, 0, "Test Evidence Report"));
        assert!(has_text(&canvas, 0, "Robin Tester"));
        assert!(has_text(&canvas, 0, "2026-03-01"));
        assert!(has_text(&canvas, 0, "Checkout"));
    }

    #[test]
    fn test_steps_paginate_past_threshold() {
        let mut images = ImageStore::new();
        images.insert("shot.png", LoadedImage::blank(170, 85));
        let canvas = render(&evidence(4, Some("shot.png")), &images);

        // Cover, then steps of ~108 mm each: two per page.
        assert_eq!(canvas.page_count(), 3);
        assert!(has_text(&canvas, 1, "Step 1"));
        assert!(has_text(&canvas, 1, "Step 2"));
        assert!(has_text(&canvas, 2, "Step 3"));
        assert!(has_text(&canvas, 2, "PASSED"));
    }

    #[test]
    fn test_failed_image_keeps_going() {
        let canvas = render(&evidence(1, Some("broken.png")), &ImageStore::new());
        assert!(has_text(&canvas, 1, "Image unavailable"));
        assert_eq!(count(&canvas, 1, |c| matches!(c, Command::Image { .. })), 0);
    }
}
