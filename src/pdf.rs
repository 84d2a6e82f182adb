use printpdf::*;
use printpdf::path::{PaintMode as PdfPaintMode, WindingOrder};
use std::io::{BufWriter, Cursor};

use crate::canvas::{Canvas, CanvasPage, Command, PaintMode};
use crate::error::{ReportError, Result};
use crate::font_metrics::Font;
use crate::geometry::{mm_to_pt, pt_to_mm, Color};
use crate::images::LoadedImage;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Serialize a recorded canvas into PDF bytes, one PDF page per canvas page.
pub fn render(canvas: &Canvas, title: &str) -> Result<Vec<u8>> {
    let width = Mm(canvas.width());
    let height = Mm(canvas.height());
    let (doc, page1, layer1) = PdfDocument::new(title, width, height, "Layer 1");

    let fonts = Fonts {
        regular: builtin(&doc, BuiltinFont::Helvetica)?,
        bold: builtin(&doc, BuiltinFont::HelveticaBold)?,
        italic: builtin(&doc, BuiltinFont::HelveticaOblique)?,
        bold_italic: builtin(&doc, BuiltinFont::HelveticaBoldOblique)?,
    };

    for (i, page) in canvas.pages().iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (new_page, new_layer) = doc.add_page(width, height, "Layer 1");
            doc.get_page(new_page).get_layer(new_layer)
        };

        let mut painter = Painter::new(&layer, &fonts, canvas.height());
        painter.draw_page(page);
    }

    let mut buf = Vec::new();
    {
        let cursor = Cursor::new(&mut buf);
        let mut writer = BufWriter::new(cursor);
        doc.save(&mut writer)
            .map_err(|e| ReportError::Pdf(e.to_string()))?;
    }

    Ok(buf)
}

fn builtin(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef> {
    doc.add_builtin_font(font)
        .map_err(|e| ReportError::Pdf(e.to_string()))
}

// ============================================================================
// FONTS
// ============================================================================

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    bold_italic: IndirectFontRef,
}

impl Fonts {
    fn get(&self, font: Font) -> &IndirectFontRef {
        match font {
            Font::Regular => &self.regular,
            Font::Bold => &self.bold,
            Font::Italic => &self.italic,
            Font::BoldItalic => &self.bold_italic,
        }
    }
}

// ============================================================================
// PAINTER
// ============================================================================

/// Color state tracked while replaying a page.
///
/// Opacity is realized by blending fill and stroke colors toward the white
/// page, so translucent overlays keep their look without relying on
/// transparency groups in the viewer.
#[derive(Debug, Clone, Copy)]
struct PaintState {
    fill: Color,
    stroke: Color,
    opacity: f32,
}

struct Painter<'a> {
    layer: &'a PdfLayerReference,
    fonts: &'a Fonts,
    page_height: f32,
    state: PaintState,
    stack: Vec<PaintState>,
}

impl<'a> Painter<'a> {
    fn new(layer: &'a PdfLayerReference, fonts: &'a Fonts, page_height: f32) -> Self {
        Painter {
            layer,
            fonts,
            page_height,
            state: PaintState {
                fill: Color::black(),
                stroke: Color::black(),
                opacity: 1.0,
            },
            stack: Vec::new(),
        }
    }

    fn draw_page(&mut self, page: &CanvasPage) {
        for command in &page.commands {
            self.draw(command);
        }
    }

    fn draw(&mut self, command: &Command) {
        match command {
            Command::SaveState => {
                self.stack.push(self.state);
                self.layer.save_graphics_state();
            }
            Command::RestoreState => {
                if let Some(state) = self.stack.pop() {
                    self.state = state;
                    self.layer.restore_graphics_state();
                }
            }
            Command::SetFillColor(color) => {
                self.state.fill = *color;
                self.apply_fill();
            }
            Command::SetStrokeColor(color) => {
                self.state.stroke = *color;
                self.apply_stroke();
            }
            Command::SetOpacity(opacity) => {
                self.state.opacity = *opacity;
                self.apply_fill();
                self.apply_stroke();
            }
            Command::SetLineWidth(width) => {
                self.layer.set_outline_thickness(mm_to_pt(*width));
            }
            Command::SetDash(dash) => {
                let pattern = match dash {
                    Some((on, off)) => LineDashPattern {
                        dash_1: Some(mm_to_pt(*on).round().max(1.0) as i64),
                        gap_1: Some(mm_to_pt(*off).round().max(1.0) as i64),
                        ..Default::default()
                    },
                    None => LineDashPattern::default(),
                };
                self.layer.set_line_dash_pattern(pattern);
            }
            Command::Rect {
                x,
                y,
                width,
                height,
                mode,
            } => {
                let points = vec![
                    (*x, *y),
                    (x + width, *y),
                    (x + width, y + height),
                    (*x, y + height),
                ];
                self.shape(points, *mode);
            }
            Command::Circle { cx, cy, r, mode } => {
                let segments = 32;
                let points = (0..segments)
                    .map(|i| {
                        let angle = 2.0 * std::f32::consts::PI * i as f32 / segments as f32;
                        (cx + r * angle.cos(), cy + r * angle.sin())
                    })
                    .collect();
                self.shape(points, *mode);
            }
            Command::Polygon { points, mode } => {
                self.shape(points.clone(), *mode);
            }
            Command::Line { x1, y1, x2, y2 } => {
                self.open_line(&[(*x1, *y1), (*x2, *y2)]);
            }
            Command::Polyline { points } => {
                self.open_line(points);
            }
            Command::Text {
                x,
                y,
                text,
                font,
                size,
            } => {
                // PDF text is positioned by its baseline; the canvas records
                // the top of the line box.
                let baseline = y + pt_to_mm(size * 0.8);
                self.layer.use_text(
                    text.as_str(),
                    *size,
                    Mm(*x),
                    Mm(self.page_height - baseline),
                    self.fonts.get(*font),
                );
            }
            Command::Image {
                x,
                y,
                width,
                height,
                image,
            } => {
                self.image(image, *x, *y, *width, *height);
            }
        }
    }

    fn point(&self, x: f32, y: f32) -> (Point, bool) {
        (Point::new(Mm(x), Mm(self.page_height - y)), false)
    }

    fn shape(&self, points: Vec<(f32, f32)>, mode: PaintMode) {
        let ring: Vec<(Point, bool)> = points.iter().map(|(x, y)| self.point(*x, *y)).collect();
        match mode {
            PaintMode::Stroke => {
                let line = Line {
                    points: ring,
                    is_closed: true,
                };
                self.layer.add_line(line);
            }
            PaintMode::Fill | PaintMode::FillStroke => {
                let polygon = Polygon {
                    rings: vec![ring],
                    mode: if mode == PaintMode::FillStroke {
                        PdfPaintMode::FillStroke
                    } else {
                        PdfPaintMode::Fill
                    },
                    winding_order: WindingOrder::NonZero,
                };
                self.layer.add_polygon(polygon);
            }
        }
    }

    fn open_line(&self, points: &[(f32, f32)]) {
        let line = Line {
            points: points.iter().map(|(x, y)| self.point(*x, *y)).collect(),
            is_closed: false,
        };
        self.layer.add_line(line);
    }

    fn apply_fill(&self) {
        let color = blend(self.state.fill, self.state.opacity);
        self.layer.set_fill_color(to_pdf_color(color));
    }

    fn apply_stroke(&self) {
        let color = blend(self.state.stroke, self.state.opacity);
        self.layer.set_outline_color(to_pdf_color(color));
    }

    fn image(&self, img: &LoadedImage, x: f32, y: f32, width: f32, height: f32) {
        if img.width == 0 || img.height == 0 {
            return;
        }

        let image = printpdf::Image::from(ImageXObject {
            width: Px(img.width as usize),
            height: Px(img.height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: img.pixels.clone(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // At 72 dpi one pixel is one point, so the scale factors map pixels
        // straight onto the requested size.
        let scale_x = mm_to_pt(width) / img.width as f32;
        let scale_y = mm_to_pt(height) / img.height as f32;

        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x)),
                translate_y: Some(Mm(self.page_height - y - height)),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                dpi: Some(72.0),
                ..Default::default()
            },
        );
    }
}

// ============================================================================
// COLOR HELPERS
// ============================================================================

/// Mix `color` with white by `1 - opacity`.
fn blend(color: Color, opacity: f32) -> Color {
    let a = opacity.clamp(0.0, 1.0);
    let mix = |c: u8| (c as f32 * a + 255.0 * (1.0 - a)).round() as u8;
    Color::rgb(mix(color.r), mix(color.g), mix(color.b))
}

fn to_pdf_color(color: Color) -> printpdf::Color {
    let (r, g, b) = color.to_unit();
    printpdf::Color::Rgb(Rgb::new(r, g, b, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::LoadedImage;
    use std::sync::Arc;

    #[test]
    fn test_blend_toward_white() {
        assert_eq!(blend(Color::black(), 1.0), Color::black());
        assert_eq!(blend(Color::black(), 0.0), Color::white());
        assert_eq!(blend(Color::rgb(0, 100, 200), 0.5), Color::rgb(128, 178, 228));
    }

    #[test]
    fn test_render_produces_one_pdf_page_per_canvas_page() {
        let mut canvas = Canvas::new(210.0, 297.0);
        canvas.set_fill_color(Color::rgb(30, 64, 175));
        canvas.rect(20.0, 20.0, 170.0, 10.0, PaintMode::Fill);
        canvas.text(20.0, 40.0, "Evidence", Font::Bold, 14.0);
        canvas.save_state();
        canvas.set_opacity(0.5);
        canvas.circle(100.0, 100.0, 5.0, PaintMode::FillStroke);
        canvas.restore_state();
        canvas.add_page();
        canvas.set_dash(Some((2.0, 2.0)));
        canvas.rect(20.0, 20.0, 50.0, 50.0, PaintMode::Stroke);
        canvas.set_dash(None);
        canvas.image(20.0, 80.0, 40.0, 20.0, Arc::new(LoadedImage::blank(4, 2)));

        let bytes = render(&canvas, "Test").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn test_empty_canvas_still_renders() {
        let canvas = Canvas::new(210.0, 297.0);
        let bytes = render(&canvas, "Empty").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
