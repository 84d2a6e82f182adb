//! Recording drawing surface.
//!
//! Renderers draw into a `Canvas` in page millimeters (origin top-left). The
//! canvas only records commands, one list per physical page; `pdf::render`
//! replays them into a PDF. Keeping the recording separate from the writer
//! lets tests inspect exactly what landed on which page.

use std::sync::Arc;

use crate::font_metrics::Font;
use crate::geometry::Color;
use crate::images::LoadedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    Fill,
    Stroke,
    FillStroke,
}

#[derive(Debug, Clone)]
pub enum Command {
    SaveState,
    RestoreState,
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(f32),
    /// `None` restores solid lines.
    SetDash(Option<(f32, f32)>),
    /// Fill and stroke alpha, 0.0..=1.0.
    SetOpacity(f32),
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        mode: PaintMode,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        mode: PaintMode,
    },
    Polygon {
        points: Vec<(f32, f32)>,
        mode: PaintMode,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    Polyline {
        points: Vec<(f32, f32)>,
    },
    /// `y` is the top of the line box, not the baseline.
    Text {
        x: f32,
        y: f32,
        text: String,
        font: Font,
        size: f32,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: Arc<LoadedImage>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct CanvasPage {
    pub commands: Vec<Command>,
}

impl CanvasPage {
    /// Text runs on this page as `(text, x, y)`.
    pub fn texts(&self) -> impl Iterator<Item = (&str, f32, f32)> {
        self.commands.iter().filter_map(|c| match c {
            Command::Text { text, x, y, .. } => Some((text.as_str(), *x, *y)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Canvas {
    width: f32,
    height: f32,
    pages: Vec<CanvasPage>,
    opacity: f32,
    opacity_stack: Vec<f32>,
}

impl Canvas {
    /// A canvas with its first physical page already open.
    pub fn new(width: f32, height: f32) -> Self {
        Canvas {
            width,
            height,
            pages: vec![CanvasPage::default()],
            opacity: 1.0,
            opacity_stack: Vec::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn pages(&self) -> &[CanvasPage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Zero-based index of the page currently drawn on.
    pub fn current_page(&self) -> usize {
        self.pages.len() - 1
    }

    /// Opens a new physical page. Graphics state does not carry over.
    pub fn add_page(&mut self) {
        self.pages.push(CanvasPage::default());
        self.opacity = 1.0;
        self.opacity_stack.clear();
    }

    fn push(&mut self, command: Command) {
        if let Some(page) = self.pages.last_mut() {
            page.commands.push(command);
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn save_state(&mut self) {
        self.opacity_stack.push(self.opacity);
        self.push(Command::SaveState);
    }

    pub fn restore_state(&mut self) {
        if let Some(opacity) = self.opacity_stack.pop() {
            self.opacity = opacity;
            self.push(Command::RestoreState);
        }
    }

    /// Values outside 0..=1 are clamped; non-finite values leave the surface
    /// fully opaque.
    pub fn set_opacity(&mut self, opacity: f32) {
        let opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            tracing::debug!("ignoring non-finite opacity");
            1.0
        };
        self.opacity = opacity;
        self.push(Command::SetOpacity(opacity));
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.push(Command::SetLineWidth(width.max(0.0)));
    }

    pub fn set_dash(&mut self, dash: Option<(f32, f32)>) {
        self.push(Command::SetDash(dash));
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, mode: PaintMode) {
        self.push(Command::Rect {
            x,
            y,
            width,
            height,
            mode,
        });
    }

    pub fn circle(&mut self, cx: f32, cy: f32, r: f32, mode: PaintMode) {
        self.push(Command::Circle { cx, cy, r, mode });
    }

    pub fn polygon(&mut self, points: Vec<(f32, f32)>, mode: PaintMode) {
        if points.len() < 3 {
            return;
        }
        self.push(Command::Polygon { points, mode });
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.push(Command::Line { x1, y1, x2, y2 });
    }

    pub fn polyline(&mut self, points: Vec<(f32, f32)>) {
        if points.len() < 2 {
            return;
        }
        self.push(Command::Polyline { points });
    }

    pub fn text(&mut self, x: f32, y: f32, text: impl Into<String>, font: Font, size: f32) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.push(Command::Text {
            x,
            y,
            text,
            font,
            size,
        });
    }

    pub fn image(&mut self, x: f32, y: f32, width: f32, height: f32, image: Arc<LoadedImage>) {
        self.push(Command::Image {
            x,
            y,
            width,
            height,
            image,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_one_page() {
        let canvas = Canvas::new(210.0, 297.0);
        assert_eq!(canvas.page_count(), 1);
        assert_eq!(canvas.current_page(), 0);
        assert_eq!(canvas.opacity(), 1.0);
    }

    #[test]
    fn test_commands_land_on_current_page() {
        let mut canvas = Canvas::new(210.0, 297.0);
        canvas.rect(0.0, 0.0, 10.0, 10.0, PaintMode::Fill);
        canvas.add_page();
        canvas.text(20.0, 20.0, "hello", Font::Regular, 10.0);
        canvas.text(20.0, 30.0, "", Font::Regular, 10.0);

        assert_eq!(canvas.pages()[0].commands.len(), 1);
        let texts: Vec<_> = canvas.pages()[1].texts().collect();
        assert_eq!(texts, vec![("hello", 20.0, 20.0)]);
    }

    #[test]
    fn test_opacity_stack() {
        let mut canvas = Canvas::new(210.0, 297.0);
        canvas.save_state();
        canvas.set_opacity(0.4);
        assert_eq!(canvas.opacity(), 0.4);
        canvas.restore_state();
        assert_eq!(canvas.opacity(), 1.0);

        canvas.set_opacity(7.0);
        assert_eq!(canvas.opacity(), 1.0);
        canvas.set_opacity(f32::NAN);
        assert_eq!(canvas.opacity(), 1.0);

        // Unbalanced restore is ignored.
        canvas.restore_state();
        assert!(!canvas.pages()[0]
            .commands
            .iter()
            .skip(3)
            .any(|c| matches!(c, Command::RestoreState)));
    }

    #[test]
    fn test_degenerate_shapes_skipped() {
        let mut canvas = Canvas::new(210.0, 297.0);
        canvas.polygon(vec![(0.0, 0.0), (1.0, 1.0)], PaintMode::Fill);
        canvas.polyline(vec![(0.0, 0.0)]);
        assert!(canvas.pages()[0].commands.is_empty());
    }
}
