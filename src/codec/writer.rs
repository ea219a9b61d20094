//! WordprocessingML part writers.

use std::collections::BTreeSet;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{DocxServerError, Result};
use crate::model::{
    Block, DocumentModel, Paragraph, Picture, Run, RunFormatting, StyleSheet, Table,
};

pub(crate) const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const PACKAGE_RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const STYLES_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Text width of a Letter page with 1" margins, in twentieths of a point.
const TEXT_WIDTH_TWIPS: usize = 9360;

pub(crate) const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

fn xml_write_error(err: impl std::fmt::Display) -> DocxServerError {
    DocxServerError::internal(format!("XML write failed: {err}"))
}

/// Thin event writer over an in-memory buffer.
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Result<Self> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_write_error)?;
        Ok(Self { writer })
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer
            .write_event(Event::Start(start))
            .map_err(xml_write_error)
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer
            .write_event(Event::Empty(start))
            .map_err(xml_write_error)
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_write_error)
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_write_error)
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner()).map_err(xml_write_error)
    }
}

/// Pictures in block order. The n-th one (counting from 1) is stored as
/// `word/media/image{n}.{ext}` under relationship `rId{n + 1}`.
pub(crate) fn pictures(model: &DocumentModel) -> impl Iterator<Item = &Picture> {
    model.blocks().iter().filter_map(|block| match block {
        Block::Picture(picture) => Some(picture),
        _ => None,
    })
}

/// Media target relative to `word/`.
pub(crate) fn media_target(number: usize, picture: &Picture) -> String {
    format!("media/image{number}.{}", picture.format().extension())
}

fn image_rel_id(number: usize) -> String {
    format!("rId{}", number + 1)
}

/// `[Content_Types].xml`, with a default for every embedded image type.
pub(crate) fn content_types_xml(model: &DocumentModel) -> Result<String> {
    let mut out = XmlOut::new()?;
    out.start("Types", &[("xmlns", CONTENT_TYPES_NS)])?;
    out.empty(
        "Default",
        &[
            ("Extension", "rels"),
            ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        ],
    )?;
    out.empty(
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    let formats: BTreeSet<_> = pictures(model).map(Picture::format).collect();
    for format in formats {
        out.empty(
            "Default",
            &[
                ("Extension", format.extension()),
                ("ContentType", format.content_type()),
            ],
        )?;
    }
    out.empty(
        "Override",
        &[
            ("PartName", "/word/document.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
            ),
        ],
    )?;
    out.empty(
        "Override",
        &[
            ("PartName", "/word/styles.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
            ),
        ],
    )?;
    out.end("Types")?;
    out.finish()
}

/// `word/_rels/document.xml.rels`: styles plus one entry per picture.
pub(crate) fn document_rels_xml(model: &DocumentModel) -> Result<String> {
    let mut out = XmlOut::new()?;
    out.start("Relationships", &[("xmlns", PACKAGE_RELS_NS)])?;
    out.empty(
        "Relationship",
        &[("Id", "rId1"), ("Type", STYLES_REL), ("Target", "styles.xml")],
    )?;
    for (number, picture) in (1..).zip(pictures(model)) {
        let id = image_rel_id(number);
        let target = media_target(number, picture);
        out.empty(
            "Relationship",
            &[("Id", &id), ("Type", IMAGE_REL), ("Target", &target)],
        )?;
    }
    out.end("Relationships")?;
    out.finish()
}

/// Serialize the body into `word/document.xml`.
pub(crate) fn document_xml(model: &DocumentModel) -> Result<String> {
    let mut out = XmlOut::new()?;
    out.start(
        "w:document",
        &[
            ("xmlns:w", W_NS),
            ("xmlns:r", R_NS),
            ("xmlns:wp", WP_NS),
            ("xmlns:a", A_NS),
            ("xmlns:pic", PIC_NS),
        ],
    )?;
    out.start("w:body", &[])?;

    let mut picture_number = 0;
    for block in model.blocks() {
        match block {
            Block::Paragraph(paragraph) => write_paragraph(&mut out, paragraph)?,
            Block::Table(table) => write_table(&mut out, table)?,
            Block::Picture(picture) => {
                picture_number += 1;
                write_picture(&mut out, picture, picture_number)?;
            }
        }
    }

    out.start("w:sectPr", &[])?;
    out.empty("w:pgSz", &[("w:w", "12240"), ("w:h", "15840")])?;
    out.empty(
        "w:pgMar",
        &[
            ("w:top", "1440"),
            ("w:right", "1440"),
            ("w:bottom", "1440"),
            ("w:left", "1440"),
            ("w:header", "720"),
            ("w:footer", "720"),
            ("w:gutter", "0"),
        ],
    )?;
    out.end("w:sectPr")?;

    out.end("w:body")?;
    out.end("w:document")?;
    out.finish()
}

fn write_paragraph(out: &mut XmlOut, paragraph: &Paragraph) -> Result<()> {
    out.start("w:p", &[])?;
    if let Some(style) = &paragraph.style {
        out.start("w:pPr", &[])?;
        out.empty("w:pStyle", &[("w:val", style)])?;
        out.end("w:pPr")?;
    }
    let mut breaks = paragraph.page_breaks().iter().copied().peekable();
    for (index, run) in paragraph.runs().iter().enumerate() {
        while breaks.next_if(|&at| at <= index).is_some() {
            write_page_break(out)?;
        }
        write_run(out, run)?;
    }
    for _ in breaks {
        write_page_break(out)?;
    }
    out.end("w:p")
}

fn write_page_break(out: &mut XmlOut) -> Result<()> {
    out.start("w:r", &[])?;
    out.empty("w:br", &[("w:type", "page")])?;
    out.end("w:r")
}

/// A paragraph holding one inline `w:drawing`.
fn write_picture(out: &mut XmlOut, picture: &Picture, number: usize) -> Result<()> {
    let cx = picture.width_emu().to_string();
    let cy = picture.height_emu().to_string();
    let id = number.to_string();
    let name = format!("Picture {number}");
    let file_name = format!("image{number}.{}", picture.format().extension());
    let rel_id = image_rel_id(number);

    out.start("w:p", &[])?;
    out.start("w:r", &[])?;
    out.start("w:drawing", &[])?;
    out.start(
        "wp:inline",
        &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
    )?;
    out.empty("wp:extent", &[("cx", &cx), ("cy", &cy)])?;
    out.empty("wp:docPr", &[("id", &id), ("name", &name)])?;
    out.start("wp:cNvGraphicFramePr", &[])?;
    out.empty("a:graphicFrameLocks", &[("noChangeAspect", "1")])?;
    out.end("wp:cNvGraphicFramePr")?;

    out.start("a:graphic", &[])?;
    out.start("a:graphicData", &[("uri", PIC_NS)])?;
    out.start("pic:pic", &[])?;
    out.start("pic:nvPicPr", &[])?;
    out.empty("pic:cNvPr", &[("id", "0"), ("name", &file_name)])?;
    out.empty("pic:cNvPicPr", &[])?;
    out.end("pic:nvPicPr")?;
    out.start("pic:blipFill", &[])?;
    out.empty("a:blip", &[("r:embed", &rel_id)])?;
    out.start("a:stretch", &[])?;
    out.empty("a:fillRect", &[])?;
    out.end("a:stretch")?;
    out.end("pic:blipFill")?;
    out.start("pic:spPr", &[])?;
    out.start("a:xfrm", &[])?;
    out.empty("a:off", &[("x", "0"), ("y", "0")])?;
    out.empty("a:ext", &[("cx", &cx), ("cy", &cy)])?;
    out.end("a:xfrm")?;
    out.start("a:prstGeom", &[("prst", "rect")])?;
    out.empty("a:avLst", &[])?;
    out.end("a:prstGeom")?;
    out.end("pic:spPr")?;
    out.end("pic:pic")?;
    out.end("a:graphicData")?;
    out.end("a:graphic")?;

    out.end("wp:inline")?;
    out.end("w:drawing")?;
    out.end("w:r")?;
    out.end("w:p")
}

fn write_run(out: &mut XmlOut, run: &Run) -> Result<()> {
    out.start("w:r", &[])?;
    if !run.formatting().is_empty() {
        out.start("w:rPr", &[])?;
        write_run_properties(out, run.formatting())?;
        out.end("w:rPr")?;
    }

    // Tabs and line breaks are elements of their own, not text.
    let mut segment = String::new();
    for c in run.text().chars() {
        match c {
            '\t' | '\n' => {
                write_text(out, &segment)?;
                segment.clear();
                out.empty(if c == '\t' { "w:tab" } else { "w:br" }, &[])?;
            }
            _ => segment.push(c),
        }
    }
    write_text(out, &segment)?;
    out.end("w:r")
}

fn write_text(out: &mut XmlOut, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let preserve = text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace);
    if preserve {
        out.start("w:t", &[("xml:space", "preserve")])?;
    } else {
        out.start("w:t", &[])?;
    }
    out.text(text)?;
    out.end("w:t")
}

/// `w:rPr` children, in schema order.
fn write_run_properties(out: &mut XmlOut, formatting: &RunFormatting) -> Result<()> {
    if let Some(font) = &formatting.font_name {
        out.empty(
            "w:rFonts",
            &[
                ("w:ascii", font),
                ("w:hAnsi", font),
                ("w:eastAsia", font),
                ("w:cs", font),
            ],
        )?;
    }
    write_toggle(out, "w:b", formatting.bold)?;
    write_toggle(out, "w:i", formatting.italic)?;
    if let Some(color) = &formatting.color {
        out.empty("w:color", &[("w:val", color)])?;
    }
    if let Some(size) = formatting.font_size {
        let half_points = ((size * 2.0).round() as u32).to_string();
        out.empty("w:sz", &[("w:val", &half_points)])?;
        out.empty("w:szCs", &[("w:val", &half_points)])?;
    }
    match formatting.underline {
        Some(true) => out.empty("w:u", &[("w:val", "single")])?,
        Some(false) => out.empty("w:u", &[("w:val", "none")])?,
        None => {}
    }
    Ok(())
}

fn write_toggle(out: &mut XmlOut, name: &str, value: Option<bool>) -> Result<()> {
    match value {
        Some(true) => out.empty(name, &[]),
        Some(false) => out.empty(name, &[("w:val", "0")]),
        None => Ok(()),
    }
}

fn write_table(out: &mut XmlOut, table: &Table) -> Result<()> {
    let cols = table.column_count().max(1);
    let width = (TEXT_WIDTH_TWIPS / cols).to_string();

    out.start("w:tbl", &[])?;
    out.start("w:tblPr", &[])?;
    if let Some(style) = &table.style {
        out.empty("w:tblStyle", &[("w:val", style)])?;
    }
    out.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
    out.end("w:tblPr")?;

    out.start("w:tblGrid", &[])?;
    for _ in 0..cols {
        out.empty("w:gridCol", &[("w:w", &width)])?;
    }
    out.end("w:tblGrid")?;

    for row in table.rows() {
        out.start("w:tr", &[])?;
        for cell in row {
            out.start("w:tc", &[])?;
            out.start("w:tcPr", &[])?;
            out.empty("w:tcW", &[("w:w", &width), ("w:type", "dxa")])?;
            out.end("w:tcPr")?;
            // A cell must end with a paragraph.
            if cell.paragraphs().is_empty() {
                out.empty("w:p", &[])?;
            }
            for paragraph in cell.paragraphs() {
                write_paragraph(out, paragraph)?;
            }
            out.end("w:tc")?;
        }
        out.end("w:tr")?;
    }
    out.end("w:tbl")
}

/// Serialize the style sheet into `word/styles.xml`.
pub(crate) fn styles_xml(styles: &StyleSheet) -> Result<String> {
    let mut out = XmlOut::new()?;
    out.start("w:styles", &[("xmlns:w", W_NS)])?;

    for style in styles.styles() {
        let mut attrs = vec![("w:type", style.kind.as_str()), ("w:styleId", style.id.as_str())];
        if style.is_default {
            attrs.push(("w:default", "1"));
        }
        out.start("w:style", &attrs)?;
        out.empty("w:name", &[("w:val", &style.name)])?;
        if let Some(parent) = &style.based_on {
            out.empty("w:basedOn", &[("w:val", parent)])?;
        }
        if !style.formatting.is_empty() {
            out.start("w:rPr", &[])?;
            write_run_properties(&mut out, &style.formatting)?;
            out.end("w:rPr")?;
        }
        out.end("w:style")?;
    }

    out.end("w:styles")?;
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_xml_preserves_spaces_and_formatting() {
        let mut model = DocumentModel::new();
        model.insert_paragraph(0, "Hello", Some("Heading1")).unwrap();
        model
            .add_run(
                0,
                " World",
                RunFormatting {
                    bold: Some(true),
                    font_size: Some(12.5),
                    ..Default::default()
                },
            )
            .unwrap();

        let xml = document_xml(&model).unwrap();
        assert!(xml.contains(r#"<w:pStyle w:val="Heading1"/>"#));
        assert!(xml.contains(r#"<w:t xml:space="preserve"> World</w:t>"#));
        assert!(xml.contains("<w:b/>"));
        assert!(xml.contains(r#"<w:sz w:val="25"/>"#));
    }

    #[test]
    fn test_document_xml_escapes_text() {
        let mut model = DocumentModel::new();
        model.insert_paragraph(0, "a < b & c", None).unwrap();
        let xml = document_xml(&model).unwrap();
        assert!(xml.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_table_cells_always_hold_a_paragraph() {
        let mut model = DocumentModel::new();
        model.add_table(0, 1, 2, Some("TableGrid"), None).unwrap();
        let xml = document_xml(&model).unwrap();
        assert_eq!(xml.matches("<w:tc>").count(), 2);
        assert!(xml.contains(r#"<w:tblStyle w:val="TableGrid"/>"#));
    }

    #[test]
    fn test_page_break_between_runs_keeps_its_place() {
        let mut paragraph = Paragraph::new(None);
        paragraph.push_run(Run::new("Before", RunFormatting::default()).unwrap());
        paragraph.push_page_break();
        paragraph.push_run(Run::new("After", RunFormatting::default()).unwrap());
        paragraph.push_page_break();
        let model = DocumentModel::from_parts(
            vec![Block::Paragraph(paragraph)],
            StyleSheet::builtin(),
        );

        let xml = document_xml(&model).unwrap();
        let before = xml.find("Before").unwrap();
        let first_break = xml.find(r#"w:type="page""#).unwrap();
        let after = xml.find("After").unwrap();
        let last_break = xml.rfind(r#"w:type="page""#).unwrap();
        assert!(before < first_break && first_break < after && after < last_break);
    }

    #[test]
    fn test_picture_parts_are_linked() {
        let mut model = DocumentModel::new();
        let png = crate::model::picture::tests::png_bytes(4, 4);
        let picture = Picture::from_image(png, Some(1.0), None).unwrap();
        model.insert_picture(0, picture).unwrap();

        let xml = document_xml(&model).unwrap();
        assert!(xml.contains(r#"<wp:extent cx="914400" cy="914400"/>"#));
        assert!(xml.contains(r#"<a:blip r:embed="rId2"/>"#));

        let rels = document_rels_xml(&model).unwrap();
        assert!(rels.contains(r#"Id="rId2""#));
        assert!(rels.contains(r#"Target="media/image1.png""#));

        let types = content_types_xml(&model).unwrap();
        assert!(types.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
    }

    #[test]
    fn test_styles_xml_lists_builtin_styles() {
        let xml = styles_xml(&StyleSheet::builtin()).unwrap();
        assert!(xml.contains(r#"w:styleId="Heading1""#));
        assert!(xml.contains(r#"w:styleId="TableGrid""#));
        assert!(xml.contains(r#"w:default="1""#));
    }
}
