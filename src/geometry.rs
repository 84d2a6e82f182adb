//! Page geometry, unit conversion and color parsing.
//!
//! All layout happens in millimeters with a top-left origin. The PDF writer
//! flips the y axis when it serializes the canvas.

use serde::{Deserialize, Serialize};

// ============================================================================
// PAGE CONSTANTS (ISO A4)
// ============================================================================

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;

pub const MARGIN_X: f32 = 20.0;
pub const TOP_MARGIN: f32 = 20.0;
pub const BOTTOM_MARGIN: f32 = 30.0;

/// Width of the single text column used by every layout.
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;

/// Vertical gap inserted after each block in the dynamic interpreter.
pub const BLOCK_GAP: f32 = 5.0;

/// Width of the block builder canvas, in builder pixels.
pub const BUILDER_WIDTH_PX: f32 = 500.0;

const MM_PER_INCH: f32 = 25.4;
const CSS_DPI: f32 = 96.0;
const PT_PER_INCH: f32 = 72.0;

// ============================================================================
// UNIT CONVERSION
// ============================================================================

/// UI pixels (96 dpi) to millimeters.
pub fn px_to_mm(px: f32) -> f32 {
    px * MM_PER_INCH / CSS_DPI
}

pub fn mm_to_px(mm: f32) -> f32 {
    mm * CSS_DPI / MM_PER_INCH
}

/// Typographic points to millimeters.
pub fn pt_to_mm(pt: f32) -> f32 {
    pt * MM_PER_INCH / PT_PER_INCH
}

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_INCH / MM_PER_INCH
}

/// Maps a width from the block builder (0..=500 px) onto the content column
/// (0..=170 mm). This is a proportional mapping, not a dpi conversion.
pub fn builder_px_to_mm(px: f32) -> f32 {
    let px = if px.is_finite() { px.clamp(0.0, BUILDER_WIDTH_PX) } else { 0.0 };
    px / BUILDER_WIDTH_PX * CONTENT_WIDTH
}

/// Scale `(width, height)` to fit inside `(max_w, max_h)` preserving aspect
/// ratio. Small images are scaled up until one side touches the box.
pub fn fit_within(width: f32, height: f32, max_w: f32, max_h: f32) -> (f32, f32) {
    if width <= 0.0 || height <= 0.0 {
        return (max_w, max_h);
    }
    let scale = (max_w / width).min(max_h / height);
    (width * scale, height * scale)
}

// ============================================================================
// COLOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    pub const fn black() -> Self {
        Color::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Color::rgb(255, 255, 255)
    }

    /// Parse `#rrggbb`, `rrggbb` or the short `#rgb` form.
    pub fn from_hex(hex: &str) -> Option<Color> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            6 => {
                let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
                let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
                let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
                Some(Color::rgb(r, g, b))
            }
            3 => {
                let mut channels = digits.chars().map(|c| {
                    let v = c.to_digit(16).unwrap_or(0) as u8;
                    v * 17
                });
                Some(Color::rgb(channels.next()?, channels.next()?, channels.next()?))
            }
            _ => None,
        }
    }

    /// Lowercase `rrggbb` without the leading hash, as OOXML expects.
    pub fn to_hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels normalized to 0.0..=1.0.
    pub fn to_unit(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Color::from_hex("#1e40af"), Some(Color::rgb(0x1e, 0x40, 0xaf)));
        assert_eq!(Color::from_hex("FFFFFF"), Some(Color::white()));
        assert_eq!(Color::from_hex("#fa0"), Some(Color::rgb(255, 170, 0)));
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
        assert_eq!(Color::from_hex(""), None);
    }

    #[test]
    fn test_hex_round_trip_format() {
        assert_eq!(Color::rgb(10, 200, 255).to_hex(), "0ac8ff");
    }

    #[test]
    fn test_builder_mapping() {
        assert!((builder_px_to_mm(150.0) - 51.0).abs() < 1e-4);
        assert_eq!(builder_px_to_mm(500.0), CONTENT_WIDTH);
        assert_eq!(builder_px_to_mm(900.0), CONTENT_WIDTH);
        assert_eq!(builder_px_to_mm(-3.0), 0.0);
    }

    #[test]
    fn test_px_mm_conversion() {
        assert!((px_to_mm(96.0) - 25.4).abs() < 1e-4);
        assert!((mm_to_px(px_to_mm(123.0)) - 123.0).abs() < 1e-3);
        assert!((pt_to_mm(72.0) - 25.4).abs() < 1e-4);
    }

    #[test]
    fn test_fit_within() {
        let (w, h) = fit_within(400.0, 200.0, 170.0, 100.0);
        assert!((w - 170.0).abs() < 1e-4);
        assert!((h - 85.0).abs() < 1e-4);

        let (w, h) = fit_within(100.0, 400.0, 170.0, 100.0);
        assert!((h - 100.0).abs() < 1e-4);
        assert!((w - 25.0).abs() < 1e-4);
    }
}
