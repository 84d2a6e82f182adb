//! Font metrics for the built-in Helvetica family, and word wrapping.
//!
//! Widths are in 1/1000 of the em square (standard AFM units), indexed by
//! code point for printable ASCII.

use crate::geometry::pt_to_mm;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.2;

/// The four faces of the built-in Helvetica family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl Font {
    pub fn metrics(&self) -> &'static FontMetrics {
        match self {
            Font::Regular | Font::Italic => &HELVETICA,
            Font::Bold | Font::BoldItalic => &HELVETICA_BOLD,
        }
    }
}

#[derive(Debug)]
pub struct FontMetrics {
    /// Widths for U+0020..=U+007E.
    ascii: [u16; 95],
    default_width: u16,
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
}

impl FontMetrics {
    pub fn char_width(&self, c: char) -> u16 {
        let code = c as u32;
        if (0x20..=0x7e).contains(&code) {
            return self.ascii[(code - 0x20) as usize];
        }
        match c {
            '\u{2013}' => 556,
            '\u{2014}' | '\u{2026}' | '\u{2122}' => 1000,
            '\u{2022}' => 350,
            '\u{2018}' | '\u{2019}' => 222,
            '\u{201C}' | '\u{201D}' => 333,
            '\u{00A9}' | '\u{00AE}' => 737,
            '\u{00B0}' => 400,
            _ => self.default_width,
        }
    }

    /// Width of a string in points.
    pub fn string_width(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f32 / self.units_per_em as f32 * font_size
    }

    /// Width of a string in millimeters.
    pub fn string_width_mm(&self, text: &str, font_size: f32) -> f32 {
        pt_to_mm(self.string_width(text, font_size))
    }

    pub fn char_width_pt(&self, c: char, font_size: f32) -> f32 {
        self.char_width(c) as f32 / self.units_per_em as f32 * font_size
    }
}

#[rustfmt::skip]
static HELVETICA: FontMetrics = FontMetrics {
    ascii: [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
        1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
        667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
        333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
        556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
    ],
    default_width: 556,
    units_per_em: 1000,
    ascender: 718,
    descender: -207,
};

#[rustfmt::skip]
static HELVETICA_BOLD: FontMetrics = FontMetrics {
    ascii: [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
        975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
        667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
        333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
        611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
    ],
    default_width: 556,
    units_per_em: 1000,
    ascender: 718,
    descender: -207,
};

/// Height of one text line in millimeters.
pub fn line_height_mm(font_size: f32) -> f32 {
    pt_to_mm(font_size * LINE_HEIGHT)
}

/// Greedy word wrap to `max_width_mm`. Explicit newlines start a new line;
/// a word wider than the column stays on a line of its own.
pub fn wrap_text(text: &str, font_size: f32, max_width_mm: f32, font: Font) -> Vec<String> {
    let metrics = font.metrics();
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let tentative = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if metrics.string_width_mm(&tentative, font_size) > max_width_mm && !current.is_empty() {
                lines.push(current);
                current = word.to_string();
            } else {
                current = tentative;
            }
        }
        lines.push(current);
    }

    // Trailing blank paragraphs add nothing visible.
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}
