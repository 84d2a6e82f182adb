use serde::{Deserialize, Serialize};

use crate::geometry::Color;

/// Closed set of theme keys. Anything else is rejected when the report
/// configuration is deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKey {
    #[default]
    Blue,
    Green,
    Purple,
    Red,
    Slate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusColors {
    pub background: Color,
    pub text: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub text: Color,
    pub text_light: Color,
    pub background_light: Color,
    pub success: StatusColors,
    pub failure: StatusColors,
}

const SUCCESS: StatusColors = StatusColors {
    background: Color::rgb(220, 252, 231),
    text: Color::rgb(22, 101, 52),
};

const FAILURE: StatusColors = StatusColors {
    background: Color::rgb(254, 226, 226),
    text: Color::rgb(153, 27, 27),
};

const BLUE: Palette = Palette {
    primary: Color::rgb(30, 64, 175),
    secondary: Color::rgb(59, 130, 246),
    text: Color::rgb(31, 41, 55),
    text_light: Color::rgb(107, 114, 128),
    background_light: Color::rgb(239, 246, 255),
    success: SUCCESS,
    failure: FAILURE,
};

const GREEN: Palette = Palette {
    primary: Color::rgb(4, 120, 87),
    secondary: Color::rgb(16, 185, 129),
    text: Color::rgb(6, 78, 59),
    text_light: Color::rgb(107, 114, 128),
    background_light: Color::rgb(236, 253, 245),
    success: SUCCESS,
    failure: FAILURE,
};

const PURPLE: Palette = Palette {
    primary: Color::rgb(109, 40, 217),
    secondary: Color::rgb(167, 139, 250),
    text: Color::rgb(46, 16, 101),
    text_light: Color::rgb(113, 113, 122),
    background_light: Color::rgb(245, 243, 255),
    success: SUCCESS,
    failure: FAILURE,
};

const RED: Palette = Palette {
    primary: Color::rgb(185, 28, 28),
    secondary: Color::rgb(248, 113, 113),
    text: Color::rgb(69, 10, 10),
    text_light: Color::rgb(115, 115, 115),
    background_light: Color::rgb(254, 242, 242),
    success: SUCCESS,
    failure: StatusColors {
        background: Color::rgb(255, 237, 213),
        text: Color::rgb(154, 52, 18),
    },
};

const SLATE: Palette = Palette {
    primary: Color::rgb(51, 65, 85),
    secondary: Color::rgb(100, 116, 139),
    text: Color::rgb(15, 23, 42),
    text_light: Color::rgb(100, 116, 139),
    background_light: Color::rgb(241, 245, 249),
    success: SUCCESS,
    failure: FAILURE,
};

pub fn resolve(key: ThemeKey) -> Palette {
    match key {
        ThemeKey::Blue => BLUE,
        ThemeKey::Green => GREEN,
        ThemeKey::Purple => PURPLE,
        ThemeKey::Red => RED,
        ThemeKey::Slate => SLATE,
    }
}
