//! Style resolution.
//!
//! Every style value follows the same chain: the most specific value that is
//! set wins, then the template-wide setting, then the theme default. The
//! legacy `globalBorderWidth` sits between the template setting and the
//! default for both border widths.

use tracing::debug;

use crate::geometry::Color;
use crate::model::{BlockSettings, Decoration, ReportConfig, TemplateSettings};
use crate::theme::Palette;

pub const DEFAULT_BLOCK_BORDER_WIDTH: f32 = 0.5;
pub const DEFAULT_DECORATION_BORDER_WIDTH: f32 = 0.0;
pub const DEFAULT_DECORATION_OPACITY: f32 = 1.0;

/// `specific ?? group ?? default`.
pub fn resolve<T>(specific: Option<T>, group: Option<T>, default: T) -> T {
    specific.or(group).unwrap_or(default)
}

/// First level holding a parseable hex color, else `default`.
pub fn resolve_color(levels: &[Option<&str>], default: Color) -> Color {
    for hex in levels.iter().flatten() {
        match Color::from_hex(hex) {
            Some(color) => return color,
            None => debug!("ignoring invalid color {:?}", hex),
        }
    }
    default
}

pub fn accent_color(settings: &TemplateSettings, palette: &Palette) -> Color {
    resolve_color(&[settings.accent_color.as_deref()], palette.primary)
}

pub fn block_border_width(block: &BlockSettings, settings: &TemplateSettings) -> f32 {
    resolve(
        block.border_width,
        settings.block_border_width.or(settings.global_border_width),
        DEFAULT_BLOCK_BORDER_WIDTH,
    )
}

pub fn block_border_color(block: &BlockSettings, settings: &TemplateSettings, palette: &Palette) -> Color {
    resolve_color(
        &[block.border_color.as_deref(), settings.accent_color.as_deref()],
        palette.primary,
    )
}

pub fn decoration_color(decoration: &Decoration, settings: &TemplateSettings, palette: &Palette) -> Color {
    resolve_color(
        &[decoration.color.as_deref(), settings.accent_color.as_deref()],
        palette.primary,
    )
}

pub fn decoration_opacity(decoration: &Decoration, settings: &TemplateSettings) -> f32 {
    resolve(
        decoration.opacity,
        settings.decoration_opacity,
        DEFAULT_DECORATION_OPACITY,
    )
}

pub fn decoration_border_width(decoration: &Decoration, settings: &TemplateSettings) -> f32 {
    resolve(
        decoration.border_width,
        settings.decoration_border_width.or(settings.global_border_width),
        DEFAULT_DECORATION_BORDER_WIDTH,
    )
}

pub fn title_color(config: &ReportConfig, palette: &Palette) -> Color {
    resolve_color(&[config.title_color.as_deref()], palette.primary)
}

pub fn subtitle_color(config: &ReportConfig, palette: &Palette) -> Color {
    resolve_color(&[config.subtitle_color.as_deref()], palette.secondary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Shape;
    use crate::theme::{self, ThemeKey};

    fn decoration() -> Decoration {
        Decoration {
            id: None,
            shape: Shape::Circle,
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            color: None,
            opacity: None,
            border_width: None,
            z_index: 0,
        }
    }

    #[test]
    fn test_resolve_order() {
        assert_eq!(resolve(Some(1), Some(2), 3), 1);
        assert_eq!(resolve(None, Some(2), 3), 2);
        assert_eq!(resolve::<i32>(None, None, 3), 3);
    }

    #[test]
    fn test_decoration_color_levels() {
        let palette = theme::resolve(ThemeKey::Blue);
        let mut settings = TemplateSettings::default();
        let mut deco = decoration();

        // Theme default.
        assert_eq!(decoration_color(&deco, &settings, &palette), palette.primary);

        // Template accent overrides the theme.
        settings.accent_color = Some("#00ff00".into());
        assert_eq!(decoration_color(&deco, &settings, &palette), Color::rgb(0, 255, 0));

        // Own color overrides the accent.
        deco.color = Some("#0000ff".into());
        assert_eq!(decoration_color(&deco, &settings, &palette), Color::rgb(0, 0, 255));
    }

    #[test]
    fn test_invalid_color_falls_through() {
        let palette = theme::resolve(ThemeKey::Green);
        let settings = TemplateSettings {
            accent_color: Some("#123456".into()),
            ..Default::default()
        };
        let mut deco = decoration();
        deco.color = Some("not-a-color".into());
        assert_eq!(decoration_color(&deco, &settings, &palette), Color::rgb(0x12, 0x34, 0x56));
    }

    #[test]
    fn test_border_width_legacy_fallback() {
        let mut settings = TemplateSettings::default();
        let mut block = BlockSettings::default();
        let mut deco = decoration();

        assert_eq!(block_border_width(&block, &settings), DEFAULT_BLOCK_BORDER_WIDTH);
        assert_eq!(decoration_border_width(&deco, &settings), 0.0);

        settings.global_border_width = Some(1.5);
        assert_eq!(block_border_width(&block, &settings), 1.5);
        assert_eq!(decoration_border_width(&deco, &settings), 1.5);

        settings.block_border_width = Some(2.0);
        settings.decoration_border_width = Some(3.0);
        assert_eq!(block_border_width(&block, &settings), 2.0);
        assert_eq!(decoration_border_width(&deco, &settings), 3.0);

        block.border_width = Some(0.25);
        deco.border_width = Some(0.0);
        assert_eq!(block_border_width(&block, &settings), 0.25);
        assert_eq!(decoration_border_width(&deco, &settings), 0.0);
    }

    #[test]
    fn test_decoration_opacity_levels() {
        let mut settings = TemplateSettings::default();
        let mut deco = decoration();
        assert_eq!(decoration_opacity(&deco, &settings), 1.0);
        settings.decoration_opacity = Some(0.4);
        assert_eq!(decoration_opacity(&deco, &settings), 0.4);
        deco.opacity = Some(0.9);
        assert_eq!(decoration_opacity(&deco, &settings), 0.9);
    }

    #[test]
    fn test_title_override_colors() {
        let palette = theme::resolve(ThemeKey::Red);
        let mut config = ReportConfig::default();
        assert_eq!(title_color(&config, &palette), palette.primary);
        assert_eq!(subtitle_color(&config, &palette), palette.secondary);
        config.title_color = Some("#ffffff".into());
        assert_eq!(title_color(&config, &palette), Color::white());
    }
}
