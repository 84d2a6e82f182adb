//! Creative layout: bold cover and one full-bleed page per evidence item.

use super::{RenderContext, Template};
use crate::canvas::PaintMode;
use crate::font_metrics::Font;
use crate::geometry::{Color, CONTENT_WIDTH, MARGIN_X, PAGE_HEIGHT, PAGE_WIDTH};
use crate::model::Evidence;
use crate::style;

const HERO_MAX_HEIGHT: f32 = 150.0;
const BAND_HEIGHT: f32 = 22.0;

#[derive(Debug, Default)]
pub struct Creative;

impl Creative {
    fn item_page(&self, ctx: &mut RenderContext<'_>, index: usize, item: &Evidence) {
        let palette = ctx.palette;
        ctx.canvas.add_page();

        let hero_h = match item.image.as_deref() {
            Some(image) => {
                let (w, h) = ctx.image_size(image, PAGE_WIDTH, HERO_MAX_HEIGHT);
                ctx.image_or_placeholder(image, (PAGE_WIDTH - w) / 2.0, 0.0, w, h);
                h
            }
            None => {
                ctx.canvas.set_fill_color(palette.background_light);
                ctx.canvas.rect(0.0, 0.0, PAGE_WIDTH, HERO_MAX_HEIGHT, PaintMode::Fill);
                ctx.text_centered(HERO_MAX_HEIGHT / 2.0, "No image captured", Font::Italic, 12.0, palette.text_light);
                HERO_MAX_HEIGHT
            }
        };

        ctx.canvas.set_fill_color(palette.primary);
        ctx.canvas.rect(0.0, hero_h, PAGE_WIDTH, BAND_HEIGHT, PaintMode::Fill);
        ctx.text(MARGIN_X, hero_h + 6.0, &format!("{:02}", index + 1), Font::Bold, 20.0, Color::white());
        let badge_x = MARGIN_X + CONTENT_WIDTH - ctx.badge_width(item.status);
        ctx.status_badge(badge_x, hero_h + 8.0, item.status);
        let title_w = badge_x - (MARGIN_X + 18.0) - 4.0;
        ctx.paragraph(MARGIN_X + 18.0, hero_h + 7.0, title_w, &item.title, Font::Bold, 15.0, Color::white());

        let mut y = hero_h + BAND_HEIGHT + 10.0;
        if let Some(caption) = item.metadata.as_ref().and_then(|m| m.caption()) {
            ctx.text(MARGIN_X, y, &caption, Font::Italic, 9.0, palette.text_light);
            y += 7.0;
        }
        if !item.description.trim().is_empty() {
            ctx.paragraph(MARGIN_X, y, CONTENT_WIDTH, &item.description, Font::Regular, 11.0, palette.text);
        }
    }
}

impl Template for Creative {
    fn render_cover(&mut self, ctx: &mut RenderContext<'_>) {
        let palette = ctx.palette;
        let config = ctx.config;

        ctx.canvas.set_fill_color(palette.primary);
        ctx.canvas.rect(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT, PaintMode::Fill);
        ctx.canvas.set_fill_color(palette.secondary);
        ctx.canvas.circle(180.0, 40.0, 60.0, PaintMode::Fill);

        ctx.canvas.save_state();
        ctx.canvas.set_opacity(0.15);
        ctx.canvas.set_fill_color(Color::white());
        ctx.canvas.polygon(vec![(0.0, 180.0), (120.0, PAGE_HEIGHT), (0.0, PAGE_HEIGHT)], PaintMode::Fill);
        ctx.canvas.restore_state();

        ctx.logo_row(20.0, 16.0);

        // Overrides win; otherwise white reads best on the filled cover.
        let title_color = config
            .title_color
            .as_deref()
            .map(|_| style::title_color(config, &palette))
            .unwrap_or(Color::white());
        let subtitle_color = config
            .subtitle_color
            .as_deref()
            .map(|_| style::subtitle_color(config, &palette))
            .unwrap_or(palette.background_light);

        let mut y = ctx.paragraph(MARGIN_X, 110.0, CONTENT_WIDTH, &config.title, Font::Bold, 32.0, title_color);
        y = ctx.paragraph(MARGIN_X, y + 4.0, CONTENT_WIDTH, &config.subtitle, Font::Regular, 16.0, subtitle_color);
        ctx.rule(MARGIN_X, MARGIN_X + 30.0, y + 6.0, 1.5, Color::white());

        ctx.info_block(MARGIN_X, 235.0, Color::white(), palette.background_light);
    }

    /// One page per item, however short the item is.
    fn render_content(&mut self, ctx: &mut RenderContext<'_>, evidence: &[Evidence]) {
        for (index, item) in evidence.iter().enumerate() {
            self.item_page(ctx, index, item);
        }
    }
}
