//! Free-positioned decoration shapes for custom templates.

use crate::canvas::{Canvas, PaintMode};
use crate::model::{Decoration, Shape, TemplateSettings};
use crate::style;
use crate::theme::Palette;

/// Draws decorations in ascending z-index; ties keep authoring order.
pub fn draw(canvas: &mut Canvas, decorations: &[Decoration], settings: &TemplateSettings, palette: &Palette) {
    let mut ordered: Vec<&Decoration> = decorations.iter().collect();
    ordered.sort_by_key(|d| d.z_index);

    let accent = style::accent_color(settings, palette);
    for decoration in ordered {
        let color = style::decoration_color(decoration, settings, palette);
        let opacity = style::decoration_opacity(decoration, settings);
        let border = style::decoration_border_width(decoration, settings);
        let mode = if border > 0.0 {
            PaintMode::FillStroke
        } else {
            PaintMode::Fill
        };

        canvas.save_state();
        canvas.set_opacity(opacity);
        canvas.set_fill_color(color);
        if border > 0.0 {
            canvas.set_stroke_color(accent);
            canvas.set_line_width(border);
        }

        let Decoration {
            x, y, width, height, ..
        } = *decoration;
        match decoration.shape {
            Shape::Circle => {
                let r = width.min(height) / 2.0;
                canvas.circle(x + width / 2.0, y + height / 2.0, r, mode);
            }
            Shape::Square => canvas.rect(x, y, width, height, mode),
            Shape::Triangle => canvas.polygon(
                vec![(x + width / 2.0, y), (x + width, y + height), (x, y + height)],
                mode,
            ),
            Shape::Wave => {
                canvas.set_stroke_color(color);
                canvas.set_line_width(if border > 0.0 { border } else { 1.0 });
                let mid = y + height / 2.0;
                canvas.line(x, mid, x + width, mid);
            }
        }

        canvas.restore_state();
    }
}
