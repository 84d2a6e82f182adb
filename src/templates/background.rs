//! Repeating background patterns for custom templates.

use crate::canvas::{Canvas, PaintMode};
use crate::model::{Background, Pattern};
use crate::style::resolve_color;
use crate::theme::Palette;

const CIRCLE_SPACING: f32 = 20.0;
const CIRCLE_RADIUS: f32 = 2.0;
const DOT_SPACING: f32 = 10.0;
const DOT_RADIUS: f32 = 0.5;
const WAVE_ROW_SPACING: f32 = 15.0;
const WAVE_SEGMENT: f32 = 5.0;
const WAVE_AMPLITUDE: f32 = 2.0;
const HEX_RADIUS: f32 = 6.0;

/// Paints the pattern over the whole page at the background's opacity.
/// Opacity is restored before returning. `Pattern::None` draws nothing.
pub fn draw(canvas: &mut Canvas, background: &Background, palette: &Palette) {
    if background.pattern == Pattern::None {
        return;
    }

    let color = resolve_color(&[Some(background.color.as_str())], palette.background_light);
    let (width, height) = (canvas.width(), canvas.height());

    canvas.save_state();
    canvas.set_opacity(background.opacity);
    canvas.set_fill_color(color);
    canvas.set_stroke_color(color);
    canvas.set_line_width(0.3);

    match background.pattern {
        Pattern::None => {}
        Pattern::Circles => dots(canvas, width, height, CIRCLE_SPACING, CIRCLE_RADIUS),
        Pattern::GridDots => dots(canvas, width, height, DOT_SPACING, DOT_RADIUS),
        Pattern::Waves => waves(canvas, width, height),
        Pattern::Hexagons => hexagons(canvas, width, height),
    }

    canvas.restore_state();
}

fn dots(canvas: &mut Canvas, width: f32, height: f32, spacing: f32, radius: f32) {
    let mut y = spacing / 2.0;
    while y < height {
        let mut x = spacing / 2.0;
        while x < width {
            canvas.circle(x, y, radius, PaintMode::Fill);
            x += spacing;
        }
        y += spacing;
    }
}

fn waves(canvas: &mut Canvas, width: f32, height: f32) {
    let mut y = WAVE_ROW_SPACING / 2.0;
    while y < height {
        let mut points = Vec::new();
        let mut x = 0.0;
        let mut up = true;
        while x <= width + WAVE_SEGMENT {
            let dy = if up { -WAVE_AMPLITUDE } else { WAVE_AMPLITUDE };
            points.push((x, y + dy));
            up = !up;
            x += WAVE_SEGMENT;
        }
        canvas.polyline(points);
        y += WAVE_ROW_SPACING;
    }
}

fn hexagons(canvas: &mut Canvas, width: f32, height: f32) {
    let col_step = 3f32.sqrt() * HEX_RADIUS;
    let row_step = 1.5 * HEX_RADIUS;
    let mut row = 0;
    let mut cy = 0.0;
    while cy < height + HEX_RADIUS {
        let offset = if row % 2 == 1 { col_step / 2.0 } else { 0.0 };
        let mut cx = offset;
        while cx < width + HEX_RADIUS {
            canvas.polygon(hexagon(cx, cy, HEX_RADIUS), PaintMode::Stroke);
            cx += col_step;
        }
        row += 1;
        cy += row_step;
    }
}

/// Pointy-top hexagon centered on `(cx, cy)`.
fn hexagon(cx: f32, cy: f32, r: f32) -> Vec<(f32, f32)> {
    (0..6)
        .map(|i| {
            let angle = (60.0 * i as f32 + 30.0).to_radians();
            (cx + r * angle.cos(), cy + r * angle.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;
    use crate::theme::{self, ThemeKey};

    fn background(pattern: Pattern) -> Background {
        Background {
            pattern,
            color: "#94a3b8".into(),
            opacity: 0.5,
        }
    }

    fn page(pattern: Pattern) -> Canvas {
        let mut canvas = Canvas::new(210.0, 297.0);
        draw(&mut canvas, &background(pattern), &theme::resolve(ThemeKey::Blue));
        canvas
    }

    #[test]
    fn test_none_draws_nothing() {
        let canvas = page(Pattern::None);
        assert!(canvas.pages()[0].commands.is_empty());
    }

    #[test]
    fn test_pattern_is_wrapped_in_saved_state() {
        for pattern in [Pattern::Circles, Pattern::GridDots, Pattern::Waves, Pattern::Hexagons] {
            let canvas = page(pattern);
            let commands = &canvas.pages()[0].commands;
            assert!(matches!(commands.first(), Some(Command::SaveState)));
            assert!(matches!(commands.get(1), Some(Command::SetOpacity(o)) if *o == 0.5));
            assert!(matches!(commands.last(), Some(Command::RestoreState)));
            assert_eq!(canvas.opacity(), 1.0);
        }
    }

    #[test]
    fn test_grid_dots_cover_the_page() {
        let canvas = page(Pattern::GridDots);
        let dots = canvas.pages()[0]
            .commands
            .iter()
            .filter(|c| matches!(c, Command::Circle { .. }))
            .count();
        // 21 columns by 30 rows at 10 mm spacing.
        assert_eq!(dots, 21 * 30);
    }

    #[test]
    fn test_waves_are_polylines() {
        let canvas = page(Pattern::Waves);
        let rows = canvas.pages()[0]
            .commands
            .iter()
            .filter(|c| matches!(c, Command::Polyline { .. }))
            .count();
        assert_eq!(rows, 20);
    }

    #[test]
    fn test_hexagons_have_six_corners() {
        let canvas = page(Pattern::Hexagons);
        let first = canvas.pages()[0].commands.iter().find_map(|c| match c {
            Command::Polygon { points, mode } => Some((points.len(), *mode)),
            _ => None,
        });
        assert_eq!(first, Some((6, PaintMode::Stroke)));
    }
}
