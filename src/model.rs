use serde::Deserialize;
use serde_json::Value;

use crate::theme::ThemeKey;

// ============================================================================
// EVIDENCE
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceStatus {
    #[default]
    Pending,
    Success,
    Failure,
}

impl EvidenceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EvidenceStatus::Pending => "PENDING",
            EvidenceStatus::Success => "PASSED",
            EvidenceStatus::Failure => "FAILED",
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureMetadata {
    pub captured_at: Option<String>,
    pub source: Option<String>,
    pub window_title: Option<String>,
}

impl CaptureMetadata {
    /// One-line caption, or `None` when nothing was captured.
    pub fn caption(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.captured_at, &self.window_title, &self.source]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.trim().is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }
}

/// One captured step. Read-only input to every renderer.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Evidence {
    pub id: String,
    /// Media reference: data URI, http(s) URL, file URL or opaque path.
    pub image: Option<String>,
    pub title: String,
    pub description: String,
    pub status: EvidenceStatus,
    pub metadata: Option<CaptureMetadata>,
}

// ============================================================================
// REPORT CONFIGURATION
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogoAlignment {
    #[default]
    Left,
    Center,
    Right,
    SpaceBetween,
}

/// Everything a render needs besides the evidence list. Missing fields take
/// their defaults, so a partial JSON object is a valid configuration.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    pub theme: ThemeKey,
    pub template_id: Option<String>,
    /// Legacy layout letter (`A`, `B`) from before template ids existed.
    pub layout: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub title_color: Option<String>,
    pub subtitle_color: Option<String>,
    pub author: String,
    pub project_name: String,
    /// Cover date. Today's date when absent.
    pub date: Option<String>,
    pub show_logo: bool,
    pub logo: Option<String>,
    pub show_secondary_logo: bool,
    pub secondary_logo: Option<String>,
    pub logo_alignment: LogoAlignment,
    /// Horizontal gap between logos, in millimeters.
    pub logo_gap: f32,
    pub custom_template: Option<CustomTemplate>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            theme: ThemeKey::default(),
            template_id: None,
            layout: None,
            title: "Test Evidence Report".to_string(),
            subtitle: "Execution Evidence".to_string(),
            title_color: None,
            subtitle_color: None,
            author: String::new(),
            project_name: String::new(),
            date: None,
            show_logo: false,
            logo: None,
            show_secondary_logo: false,
            secondary_logo: None,
            logo_alignment: LogoAlignment::default(),
            logo_gap: 10.0,
            custom_template: None,
        }
    }
}

impl ReportConfig {
    /// Logos enabled for the cover, in display order.
    pub fn cover_logos(&self) -> Vec<&str> {
        let mut logos = Vec::new();
        if self.show_logo {
            if let Some(logo) = self.logo.as_deref().filter(|l| !l.is_empty()) {
                logos.push(logo);
            }
        }
        if self.show_secondary_logo {
            if let Some(logo) = self.secondary_logo.as_deref().filter(|l| !l.is_empty()) {
                logos.push(logo);
            }
        }
        logos
    }
}

// ============================================================================
// CUSTOM TEMPLATE
// ============================================================================

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomTemplate {
    pub pages: Vec<Page>,
    pub background: Background,
    pub decorations: Vec<Decoration>,
    pub settings: TemplateSettings,
}

/// Which physical pages receive the background pattern and decorations.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayScope {
    #[default]
    EveryPage,
    FirstPage,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateSettings {
    pub accent_color: Option<String>,
    pub block_border_width: Option<f32>,
    pub decoration_border_width: Option<f32>,
    pub decoration_opacity: Option<f32>,
    /// Legacy single border width, fallback for both block and decoration widths.
    pub global_border_width: Option<f32>,
    pub overlay_scope: OverlayScope,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Cover,
    #[default]
    Content,
    Summary,
    Index,
    Conclusion,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub id: Option<String>,
    /// Advisory only. Rendering does not depend on it.
    pub kind: PageKind,
    pub blocks: Vec<Block>,
}

// ============================================================================
// BACKGROUND & DECORATIONS
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Pattern {
    #[default]
    None,
    Circles,
    GridDots,
    Waves,
    Hexagons,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Background {
    pub pattern: Pattern,
    pub color: String,
    pub opacity: f32,
}

impl Default for Background {
    fn default() -> Self {
        Background {
            pattern: Pattern::None,
            color: "#e5e7eb".to_string(),
            opacity: 0.3,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Circle,
    #[serde(alias = "rectangle")]
    Square,
    Triangle,
    Wave,
}

/// Freestanding shape at an absolute page position, in millimeters.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Decoration {
    #[serde(default)]
    pub id: Option<String>,
    pub shape: Shape,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub opacity: Option<f32>,
    #[serde(default)]
    pub border_width: Option<f32>,
    #[serde(default)]
    pub z_index: i32,
}

// ============================================================================
// BLOCKS
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeaderVariant {
    #[default]
    Classic,
    Modern,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EvidenceLayout {
    #[default]
    TopBottom,
    SplitLeft,
    SplitRight,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockSettings {
    pub show_border: bool,
    pub variant: HeaderVariant,
    pub border_width: Option<f32>,
    pub border_color: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderContent {
    pub title: String,
    pub subtitle: Option<String>,
    pub show_logo: bool,
    pub logo: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct TextContent {
    pub title: Option<String>,
    pub text: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogoContent {
    pub src: Option<String>,
    /// Width in builder pixels (0..=500).
    pub width: f32,
    pub alignment: Alignment,
}

impl Default for LogoContent {
    fn default() -> Self {
        LogoContent {
            src: None,
            width: 150.0,
            alignment: Alignment::Center,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct TableContent {
    pub rows: u32,
    pub cols: u32,
}

impl Default for TableContent {
    fn default() -> Self {
        TableContent { rows: 3, cols: 3 }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EvidenceLoopContent {
    pub layout: EvidenceLayout,
    pub show_description: bool,
    /// Upper bound for each image's height, in millimeters.
    pub max_image_height: f32,
}

impl Default for EvidenceLoopContent {
    fn default() -> Self {
        EvidenceLoopContent {
            layout: EvidenceLayout::TopBottom,
            show_description: true,
            max_image_height: 100.0,
        }
    }
}

/// Closed set of block kinds. Tags the interpreter does not know become
/// `Unknown` instead of failing the whole template.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Header(HeaderContent),
    Footer(TextContent),
    Text(TextContent),
    Summary(TextContent),
    Conclusion(TextContent),
    Toc(TextContent),
    Logo(LogoContent),
    Table(TableContent),
    Grid,
    EvidenceLoop(EvidenceLoopContent),
    PageBreak,
    Unknown(String),
}

impl BlockKind {
    pub fn tag(&self) -> &str {
        match self {
            BlockKind::Header(_) => "header",
            BlockKind::Footer(_) => "footer",
            BlockKind::Text(_) => "text",
            BlockKind::Summary(_) => "summary",
            BlockKind::Conclusion(_) => "conclusion",
            BlockKind::Toc(_) => "toc",
            BlockKind::Logo(_) => "logo",
            BlockKind::Table(_) => "table",
            BlockKind::Grid => "grid",
            BlockKind::EvidenceLoop(_) => "evidence-loop",
            BlockKind::PageBreak => "page-break",
            BlockKind::Unknown(tag) => tag,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(try_from = "RawBlock")]
pub struct Block {
    pub id: Option<String>,
    pub kind: BlockKind,
    pub settings: BlockSettings,
}

impl Block {
    pub fn new(kind: BlockKind) -> Self {
        Block {
            id: None,
            kind,
            settings: BlockSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: BlockSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Wire shape of a block: `{ "type", "content", "settings" }`.
#[derive(Deserialize)]
struct RawBlock {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Value,
    #[serde(default)]
    settings: BlockSettings,
}

fn content<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    let value = match value {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(value)
}

impl TryFrom<RawBlock> for Block {
    type Error = serde_json::Error;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let kind = match raw.kind.as_str() {
            "header" => BlockKind::Header(content(raw.content)?),
            "footer" => BlockKind::Footer(content(raw.content)?),
            "text" => BlockKind::Text(content(raw.content)?),
            "summary" => BlockKind::Summary(content(raw.content)?),
            "conclusion" => BlockKind::Conclusion(content(raw.content)?),
            "toc" => BlockKind::Toc(content(raw.content)?),
            "logo" => BlockKind::Logo(content(raw.content)?),
            "table" => BlockKind::Table(content(raw.content)?),
            "grid" => BlockKind::Grid,
            "evidence-loop" => BlockKind::EvidenceLoop(content(raw.content)?),
            "page-break" => BlockKind::PageBreak,
            _ => BlockKind::Unknown(raw.kind),
        };
        Ok(Block {
            id: raw.id,
            kind,
            settings: raw.settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_merges_defaults() {
        let config: ReportConfig =
            serde_json::from_str(r#"{"theme":"green","author":"Dana","templateId":"modern"}"#).unwrap();
        assert_eq!(config.theme, ThemeKey::Green);
        assert_eq!(config.author, "Dana");
        assert_eq!(config.template_id.as_deref(), Some("modern"));
        assert_eq!(config.title, "Test Evidence Report");
        assert_eq!(config.logo_gap, 10.0);
        assert!(config.custom_template.is_none());
    }

    #[test]
    fn test_block_wire_shape() {
        let json = r#"[
            {"type":"header","content":{"title":"Run 42","showLogo":false},"settings":{"variant":"modern","showBorder":true}},
            {"type":"table","content":{"rows":2,"cols":4}},
            {"type":"evidence-loop","content":{"layout":"split-right"}},
            {"type":"page-break"},
            {"type":"sparkline","content":{"points":[1,2,3]}}
        ]"#;
        let blocks: Vec<Block> = serde_json::from_str(json).unwrap();

        match &blocks[0].kind {
            BlockKind::Header(h) => assert_eq!(h.title, "Run 42"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(blocks[0].settings.variant, HeaderVariant::Modern);
        assert!(blocks[0].settings.show_border);
        assert_eq!(blocks[1].kind, BlockKind::Table(TableContent { rows: 2, cols: 4 }));
        match &blocks[2].kind {
            BlockKind::EvidenceLoop(c) => {
                assert_eq!(c.layout, EvidenceLayout::SplitRight);
                assert!(c.show_description);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(blocks[3].kind, BlockKind::PageBreak);
        assert_eq!(blocks[4].kind, BlockKind::Unknown("sparkline".to_string()));
        assert_eq!(blocks[4].kind.tag(), "sparkline");
    }

    #[test]
    fn test_malformed_content_is_an_error() {
        let parsed: Result<Block, _> =
            serde_json::from_str(r#"{"type":"table","content":{"rows":"many"}}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_decoration_and_template_settings() {
        let json = r##"{
            "pages":[{"kind":"cover","blocks":[]}],
            "background":{"pattern":"grid-dots","color":"#cccccc","opacity":0.5},
            "decorations":[{"shape":"rectangle","x":1,"y":2,"width":3,"height":4,"zIndex":2}],
            "settings":{"accentColor":"#ff0000","globalBorderWidth":1.5,"overlayScope":"first-page"}
        }"##;
        let template: CustomTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(template.pages[0].kind, PageKind::Cover);
        assert_eq!(template.background.pattern, Pattern::GridDots);
        assert_eq!(template.decorations[0].shape, Shape::Square);
        assert_eq!(template.decorations[0].z_index, 2);
        assert_eq!(template.settings.global_border_width, Some(1.5));
        assert_eq!(template.settings.overlay_scope, OverlayScope::FirstPage);
    }

    #[test]
    fn test_metadata_caption() {
        let meta = CaptureMetadata {
            captured_at: Some("2026-01-02 10:00".into()),
            source: Some("Chrome".into()),
            window_title: None,
        };
        assert_eq!(meta.caption().as_deref(), Some("2026-01-02 10:00 | Chrome"));
        assert_eq!(CaptureMetadata::default().caption(), None);
    }

    #[test]
    fn test_cover_logos_respect_toggles() {
        let config = ReportConfig {
            show_logo: true,
            logo: Some("logo.png".into()),
            show_secondary_logo: false,
            secondary_logo: Some("other.png".into()),
            ..Default::default()
        };
        assert_eq!(config.cover_logos(), vec!["logo.png"]);
    }
}
