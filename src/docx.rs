//! Flow-document (DOCX) encoding.
//!
//! Walks the evidence list directly; templates and the canvas are not
//! involved. Only the theme and cover metadata are shared with the PDF path.

use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::geometry::{fit_within, Color};
use crate::images::ImageStore;
use crate::model::{Evidence, EvidenceStatus, ReportConfig};
use crate::style;
use crate::theme::{self, Palette};

const EMU_PER_MM: f32 = 36_000.0;
const MAX_IMAGE_WIDTH_MM: f32 = 160.0;
const MAX_IMAGE_HEIGHT_MM: f32 = 120.0;

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

/// Encodes the report as a `.docx` package.
pub fn render(evidence: &[Evidence], config: &ReportConfig, images: &ImageStore) -> Result<Vec<u8>> {
    let palette = theme::resolve(config.theme);
    let date = config
        .date
        .clone()
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());

    let mut body = Body::new(palette);
    body.cover(config, &date, evidence.len());
    body.page_break();

    if evidence.is_empty() {
        body.paragraph(&[Run::new("No evidence captured.").italic().color(palette.text_light)]);
    }
    for (index, item) in evidence.iter().enumerate() {
        body.evidence(index, item, images)?;
    }

    let mut parts: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    parts.insert("[Content_Types].xml".into(), content_types().into_bytes());
    parts.insert("_rels/.rels".into(), package_rels().into_bytes());
    parts.insert("docProps/core.xml".into(), core_properties(config).into_bytes());
    parts.insert("word/_rels/document.xml.rels".into(), body.relationships().into_bytes());
    parts.insert("word/document.xml".into(), body.document().into_bytes());
    for media in body.media {
        parts.insert(format!("word/media/{}", media.file_name), media.png);
    }

    debug!(parts = parts.len(), "writing DOCX package");
    write_package(parts)
}

/// Zips the parts in path order so identical input gives identical bytes.
fn write_package(parts: BTreeMap<String, Vec<u8>>) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (path, contents) in &parts {
        zip.start_file(path.as_str(), options)?;
        zip.write_all(contents)?;
    }
    Ok(zip.finish()?.into_inner())
}

// ============================================================================
// RUNS
// ============================================================================

#[derive(Debug, Clone)]
struct Run<'a> {
    text: &'a str,
    bold: bool,
    italic: bool,
    size: Option<f32>,
    color: Option<Color>,
}

impl<'a> Run<'a> {
    fn new(text: &'a str) -> Self {
        Run {
            text,
            bold: false,
            italic: false,
            size: None,
            color: None,
        }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    fn size(mut self, pt: f32) -> Self {
        self.size = Some(pt);
        self
    }

    fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    fn xml(&self) -> String {
        let mut props = String::new();
        if self.bold {
            props.push_str("<w:b/>");
        }
        if self.italic {
            props.push_str("<w:i/>");
        }
        if let Some(color) = self.color {
            props.push_str(&format!(r#"<w:color w:val="{}"/>"#, color.to_hex()));
        }
        if let Some(size) = self.size {
            // Word sizes are in half points.
            props.push_str(&format!(r#"<w:sz w:val="{}"/>"#, (size * 2.0).round() as u32));
        }
        format!(
            r#"<w:r><w:rPr>{}</w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
            props,
            escape(self.text)
        )
    }
}

// ============================================================================
// BODY
// ============================================================================

struct Media {
    rel_id: String,
    file_name: String,
    png: Vec<u8>,
}

struct Body {
    palette: Palette,
    xml: String,
    media: Vec<Media>,
}

impl Body {
    fn new(palette: Palette) -> Self {
        Body {
            palette,
            xml: String::new(),
            media: Vec::new(),
        }
    }

    fn paragraph(&mut self, runs: &[Run<'_>]) {
        self.xml.push_str("<w:p>");
        for run in runs {
            self.xml.push_str(&run.xml());
        }
        self.xml.push_str("</w:p>");
    }

    fn centered(&mut self, runs: &[Run<'_>]) {
        self.xml.push_str(r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr>"#);
        for run in runs {
            self.xml.push_str(&run.xml());
        }
        self.xml.push_str("</w:p>");
    }

    fn page_break(&mut self) {
        self.xml.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
    }

    fn cover(&mut self, config: &ReportConfig, date: &str, count: usize) {
        let palette = self.palette;
        let title_color = style::title_color(config, &palette);
        let subtitle_color = style::subtitle_color(config, &palette);

        self.centered(&[Run::new(&config.title).bold().size(28.0).color(title_color)]);
        self.centered(&[Run::new(&config.subtitle).size(16.0).color(subtitle_color)]);
        self.paragraph(&[]);

        let count = count.to_string();
        let rows = [
            ("Author", config.author.as_str()),
            ("Project", config.project_name.as_str()),
            ("Date", date),
            ("Evidence items", count.as_str()),
        ];
        self.info_table(&rows);
    }

    fn info_table(&mut self, rows: &[(&str, &str)]) {
        let border = self.palette.text_light.to_hex();
        let shade = self.palette.background_light.to_hex();
        self.xml.push_str(r#"<w:tbl><w:tblPr><w:tblW w:w="5000" w:type="pct"/><w:tblBorders>"#);
        for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
            self.xml.push_str(&format!(
                r#"<w:{} w:val="single" w:sz="4" w:space="0" w:color="{}"/>"#,
                side, border
            ));
        }
        self.xml.push_str(r#"</w:tblBorders></w:tblPr><w:tblGrid><w:gridCol w:w="2800"/><w:gridCol w:w="6200"/></w:tblGrid>"#);

        for (label, value) in rows {
            self.xml.push_str("<w:tr>");
            self.xml.push_str(&format!(
                r#"<w:tc><w:tcPr><w:shd w:val="clear" w:color="auto" w:fill="{}"/></w:tcPr><w:p>{}</w:p></w:tc>"#,
                shade,
                Run::new(label).bold().xml()
            ));
            self.xml.push_str(&format!("<w:tc><w:p>{}</w:p></w:tc>", Run::new(value).xml()));
            self.xml.push_str("</w:tr>");
        }
        self.xml.push_str("</w:tbl>");
    }

    fn evidence(&mut self, index: usize, item: &Evidence, images: &ImageStore) -> Result<()> {
        let palette = self.palette;
        let heading = format!("{}. {}", index + 1, item.title);
        self.paragraph(&[Run::new(&heading).bold().size(14.0).color(palette.primary)]);

        let status_color = match item.status {
            EvidenceStatus::Success => palette.success.text,
            EvidenceStatus::Failure => palette.failure.text,
            EvidenceStatus::Pending => palette.text_light,
        };
        self.paragraph(&[
            Run::new("Status: ").bold(),
            Run::new(item.status.label()).bold().color(status_color),
        ]);

        if !item.description.trim().is_empty() {
            self.paragraph(&[Run::new(&item.description)]);
        }
        if let Some(caption) = item.metadata.as_ref().and_then(|m| m.caption()) {
            self.paragraph(&[Run::new(&caption).italic().size(9.0).color(palette.text_light)]);
        }

        if let Some(reference) = item.image.as_deref() {
            match images.get(reference) {
                Some(Ok(img)) => {
                    let png = img.to_png()?;
                    let (w, h) = fit_within(
                        img.width as f32,
                        img.height as f32,
                        MAX_IMAGE_WIDTH_MM,
                        MAX_IMAGE_HEIGHT_MM,
                    );
                    self.image(png, w, h, &item.title);
                }
                Some(Err(e)) => {
                    warn!("image left out of DOCX: {}", e);
                    self.image_placeholder();
                }
                None => self.image_placeholder(),
            }
        }
        self.paragraph(&[]);
        Ok(())
    }

    fn image_placeholder(&mut self) {
        let light = self.palette.text_light;
        self.paragraph(&[Run::new("[Image unavailable]").italic().color(light)]);
    }

    fn image(&mut self, png: Vec<u8>, width_mm: f32, height_mm: f32, description: &str) {
        let id = self.media.len() + 1;
        let rel_id = format!("rIdImage{}", id);
        let cx = (width_mm * EMU_PER_MM).round() as u64;
        let cy = (height_mm * EMU_PER_MM).round() as u64;
        let name = format!("Picture {}", id);

        self.xml.push_str(&format!(
            concat!(
                r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:drawing>"#,
                r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/>"#,
                r#"<wp:docPr id="{id}" name="{name}" descr="{descr}"/>"#,
                r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
                r#"<a:graphic><a:graphicData uri="{pic_ns}"><pic:pic>"#,
                r#"<pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
                r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
            ),
            cx = cx,
            cy = cy,
            id = id,
            name = name,
            descr = escape(description),
            pic_ns = NS_PIC,
            rel = rel_id,
        ));

        self.media.push(Media {
            file_name: format!("image{}.png", id),
            rel_id,
            png,
        });
    }

    fn document(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:document xmlns:w="{w}" xmlns:r="{r}" xmlns:wp="{wp}" xmlns:a="{a}" xmlns:pic="{pic}">"#,
                "<w:body>{body}",
                r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/>"#,
                r#"<w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1134" w:header="709" w:footer="709" w:gutter="0"/>"#,
                "</w:sectPr></w:body></w:document>",
            ),
            w = NS_W,
            r = NS_R,
            wp = NS_WP,
            a = NS_A,
            pic = NS_PIC,
            body = self.xml,
        )
    }

    fn relationships(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for media in &self.media {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/{}"/>"#,
                media.rel_id, media.file_name
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

fn content_types() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
        r#"<Default Extension="xml" ContentType="application/xml"/>"#,
        r#"<Default Extension="png" ContentType="image/png"/>"#,
        r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
        r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
        "</Types>",
    )
    .to_string()
}

fn package_rels() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
        r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
        "</Relationships>",
    )
    .to_string()
}

fn core_properties(config: &ReportConfig) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
            "<dc:title>{}</dc:title><dc:subject>{}</dc:subject><dc:creator>{}</dc:creator>",
            "</cp:coreProperties>",
        ),
        escape(config.title.as_str()),
        escape(config.subtitle.as_str()),
        escape(config.author.as_str()),
    )
}
