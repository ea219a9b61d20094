//! WordprocessingML part readers.
//!
//! Only the modeled subset is kept: paragraphs with style and runs, run
//! formatting, page breaks, top-level tables, pictures that stand alone in a
//! paragraph, and style definitions. Other drawings, text boxes and nested
//! tables are skipped.

use std::borrow::Cow;
use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{DocxServerError, Result};
use crate::model::{
    Block, Cell, Paragraph, Picture, Run, RunFormatting, Style, StyleKind, Table,
};

/// Subtrees whose content is not part of the paragraph's own text.
const SKIPPED: &[&[u8]] = &[
    b"drawing",
    b"pict",
    b"object",
    b"AlternateContent",
    b"txbxContent",
    b"footnoteReference",
    b"endnoteReference",
];

/// Value of the attribute with local name `local`, unescaped.
fn attr(e: &BytesStart, local: &[u8]) -> Result<Option<String>> {
    for attribute in e.attributes().flatten() {
        if attribute.key.local_name().as_ref() == local {
            let raw = std::str::from_utf8(&attribute.value).map_err(DocxServerError::format)?;
            let value = quick_xml::escape::unescape(raw).map_err(DocxServerError::format)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn toggle(e: &BytesStart) -> Result<bool> {
    Ok(!matches!(
        attr(e, b"val")?.as_deref(),
        Some("0" | "false" | "off" | "none")
    ))
}

/// Apply one `w:rPr` child element to `formatting`.
fn apply_run_property(name: &[u8], e: &BytesStart, formatting: &mut RunFormatting) -> Result<()> {
    match name {
        b"b" => formatting.bold = Some(toggle(e)?),
        b"i" => formatting.italic = Some(toggle(e)?),
        b"u" => formatting.underline = Some(toggle(e)?),
        b"sz" => {
            formatting.font_size = attr(e, b"val")?
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|half_points| (1..=3276).contains(half_points))
                .map(|half_points| half_points as f32 / 2.0);
        }
        b"color" => {
            formatting.color = attr(e, b"val")?
                .filter(|v| v.len() == 6 && v.chars().all(|c| c.is_ascii_hexdigit()))
                .map(|v| v.to_ascii_uppercase());
        }
        b"rFonts" => {
            let font = match attr(e, b"ascii")? {
                Some(font) => Some(font),
                None => attr(e, b"hAnsi")?,
            };
            if let Some(font) = font.filter(|f| !f.trim().is_empty()) {
                formatting.font_name = Some(font);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Image bytes for a relationship id of the document part, if it has any.
pub(crate) type MediaLookup<'a> = dyn FnMut(&str) -> Result<Option<Vec<u8>>> + 'a;

fn loaded_run(text: String, formatting: RunFormatting) -> Result<Run> {
    Run::new(text, formatting).map_err(|e| DocxServerError::Format(e.to_string()))
}

fn resolve_reference(name: &str) -> Result<Cow<'static, str>> {
    if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => code.parse::<u32>(),
        };
        return parsed
            .ok()
            .and_then(char::from_u32)
            .map(|c| Cow::Owned(c.to_string()))
            .ok_or_else(|| DocxServerError::Format(format!("invalid character reference &{name};")));
    }
    quick_xml::escape::resolve_predefined_entity(name)
        .map(Cow::Borrowed)
        .ok_or_else(|| DocxServerError::Format(format!("unknown entity &{name};")))
}

#[derive(Default)]
struct RunBuilder {
    text: String,
    formatting: RunFormatting,
}

/// Inline or anchored `w:drawing` being collected.
#[derive(Default)]
struct DrawingBuilder {
    depth: usize,
    width_emu: Option<u64>,
    height_emu: Option<u64>,
    embed: Option<String>,
}

impl DrawingBuilder {
    fn observe(&mut self, e: &BytesStart) -> Result<()> {
        match e.local_name().as_ref() {
            b"extent" if self.width_emu.is_none() => {
                self.width_emu = attr(e, b"cx")?.and_then(|v| v.parse().ok());
                self.height_emu = attr(e, b"cy")?.and_then(|v| v.parse().ok());
            }
            b"blip" if self.embed.is_none() => self.embed = attr(e, b"embed")?,
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Option<PendingPicture> {
        Some(PendingPicture {
            rel_id: self.embed?,
            width_emu: self.width_emu?,
            height_emu: self.height_emu?,
        })
    }
}

struct PendingPicture {
    rel_id: String,
    width_emu: u64,
    height_emu: u64,
}

#[derive(Default)]
struct TableBuilder {
    style: Option<String>,
    rows: Vec<Vec<Cell>>,
    row: Option<Vec<Cell>>,
    cell: Option<Vec<Paragraph>>,
}

/// Streaming state while walking `w:body`.
#[derive(Default)]
struct BodyReader {
    blocks: Vec<Block>,
    paragraph: Option<Paragraph>,
    run: Option<RunBuilder>,
    table: Option<TableBuilder>,
    drawing: Option<DrawingBuilder>,
    /// Pictures found in the current paragraph.
    pictures: Vec<PendingPicture>,
    skip_depth: usize,
    in_text: bool,
    in_run_props: bool,
    in_para_props: bool,
    in_table_props: bool,
}

impl BodyReader {
    fn open(&mut self, e: &BytesStart) -> Result<()> {
        let local = e.local_name();
        let name = local.as_ref();

        if self.in_run_props {
            if let Some(run) = self.run.as_mut() {
                apply_run_property(name, e, &mut run.formatting)?;
            }
            return Ok(());
        }

        match name {
            b"tbl" => self.table = Some(TableBuilder::default()),
            b"tblPr" => self.in_table_props = self.table.is_some(),
            b"tblStyle" if self.in_table_props => {
                if let Some(table) = self.table.as_mut() {
                    table.style = attr(e, b"val")?;
                }
            }
            b"tr" => {
                if let Some(table) = self.table.as_mut() {
                    table.row = Some(Vec::new());
                }
            }
            b"tc" => {
                if let Some(table) = self.table.as_mut() {
                    table.cell = Some(Vec::new());
                }
            }
            b"p" => {
                self.paragraph = Some(Paragraph::new(None));
                self.pictures.clear();
            }
            b"pPr" => self.in_para_props = self.paragraph.is_some(),
            b"pStyle" if self.in_para_props => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.style = attr(e, b"val")?;
                }
            }
            b"r" if self.paragraph.is_some() && !self.in_para_props => {
                self.run = Some(RunBuilder::default());
            }
            b"rPr" => self.in_run_props = self.run.is_some(),
            b"t" => self.in_text = self.run.is_some(),
            b"tab" => {
                if let Some(run) = self.run.as_mut() {
                    run.text.push('\t');
                }
            }
            b"br" | b"cr" => {
                let page = attr(e, b"type")?.as_deref() == Some("page");
                match (self.run.as_mut(), self.paragraph.as_mut()) {
                    (Some(run), Some(paragraph)) if page => {
                        // Text before the break becomes its own run.
                        if !run.text.is_empty() {
                            let text = std::mem::take(&mut run.text);
                            paragraph.push_run(loaded_run(text, run.formatting.clone())?);
                        }
                        paragraph.push_page_break();
                    }
                    (Some(run), _) => run.text.push('\n'),
                    _ => {}
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Whether a `w:drawing` starting now can become a picture block.
    fn captures_drawing(&self) -> bool {
        self.run.is_some() && self.table.is_none()
    }

    fn finish_drawing(&mut self) {
        if let Some(picture) = self.drawing.take().and_then(DrawingBuilder::finish) {
            self.pictures.push(picture);
        }
    }

    /// Push a top-level paragraph. A paragraph with pictures and no text is
    /// replaced by its pictures; pictures next to text are dropped.
    fn push_paragraph(&mut self, paragraph: Paragraph, media: &mut MediaLookup) -> Result<()> {
        let pending = std::mem::take(&mut self.pictures);
        if pending.is_empty() || !paragraph.runs().is_empty() {
            self.blocks.push(Block::Paragraph(paragraph));
            return Ok(());
        }

        let mut pictures = Vec::new();
        for picture in pending {
            if let Some(data) = media(&picture.rel_id)? {
                pictures.extend(Picture::from_stored(
                    data,
                    picture.width_emu,
                    picture.height_emu,
                ));
            }
        }
        if pictures.is_empty() || !paragraph.page_breaks().is_empty() {
            self.blocks.push(Block::Paragraph(paragraph));
        }
        self.blocks.extend(pictures.into_iter().map(Block::Picture));
        Ok(())
    }

    fn close(&mut self, name: &[u8], media: &mut MediaLookup) -> Result<()> {
        match name {
            b"rPr" => self.in_run_props = false,
            b"pPr" => self.in_para_props = false,
            b"tblPr" => self.in_table_props = false,
            b"t" => self.in_text = false,
            b"r" => {
                if let (Some(run), Some(paragraph)) = (self.run.take(), self.paragraph.as_mut()) {
                    if !run.text.is_empty() {
                        paragraph.push_run(loaded_run(run.text, run.formatting)?);
                    }
                }
            }
            b"p" => {
                if let Some(paragraph) = self.paragraph.take() {
                    match self.table.as_mut() {
                        Some(table) => {
                            if let Some(cell) = table.cell.as_mut() {
                                cell.push(paragraph);
                            }
                        }
                        None => self.push_paragraph(paragraph, media)?,
                    }
                }
            }
            b"tc" => {
                if let Some(table) = self.table.as_mut() {
                    if let (Some(paragraphs), Some(row)) = (table.cell.take(), table.row.as_mut()) {
                        row.push(Cell::from_paragraphs(paragraphs));
                    }
                }
            }
            b"tr" => {
                if let Some(table) = self.table.as_mut() {
                    if let Some(row) = table.row.take() {
                        table.rows.push(row);
                    }
                }
            }
            b"tbl" => {
                if let Some(table) = self.table.take() {
                    if let Some(table) = Table::from_rows(table.rows, table.style) {
                        self.blocks.push(Block::Table(table));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if self.in_text {
            if let Some(run) = self.run.as_mut() {
                run.text.push_str(text);
            }
        }
    }
}

/// Parse `word/document.xml` into blocks. `media` supplies the bytes behind
/// picture relationship ids.
pub(crate) fn read_body(xml: &str, media: &mut MediaLookup) -> Result<Vec<Block>> {
    let mut reader = Reader::from_str(xml);
    let mut state = BodyReader::default();
    let mut saw_body = false;

    loop {
        match reader.read_event().map_err(DocxServerError::format)? {
            Event::Start(e) => {
                if state.skip_depth > 0 {
                    state.skip_depth += 1;
                    continue;
                }
                if let Some(drawing) = state.drawing.as_mut() {
                    drawing.depth += 1;
                    drawing.observe(&e)?;
                    continue;
                }
                let local = e.local_name();
                let name = local.as_ref();
                if name == b"drawing" && state.captures_drawing() {
                    state.drawing = Some(DrawingBuilder {
                        depth: 1,
                        ..Default::default()
                    });
                    continue;
                }
                // Tables nested inside cells are not modeled.
                if SKIPPED.contains(&name) || (name == b"tbl" && state.table.is_some()) {
                    state.skip_depth = 1;
                    continue;
                }
                if name == b"body" {
                    saw_body = true;
                }
                state.open(&e)?;
            }
            Event::Empty(e) => {
                if state.skip_depth > 0 {
                    continue;
                }
                if let Some(drawing) = state.drawing.as_mut() {
                    drawing.observe(&e)?;
                    continue;
                }
                let local = e.local_name();
                let name = local.as_ref();
                if SKIPPED.contains(&name) {
                    continue;
                }
                state.open(&e)?;
                state.close(name, media)?;
            }
            Event::End(e) => {
                if state.skip_depth > 0 {
                    state.skip_depth -= 1;
                    continue;
                }
                if let Some(drawing) = state.drawing.as_mut() {
                    drawing.depth -= 1;
                    if drawing.depth == 0 {
                        state.finish_drawing();
                    }
                    continue;
                }
                state.close(e.local_name().as_ref(), media)?;
            }
            Event::Text(e) => {
                if state.skip_depth == 0 && state.in_text {
                    let raw = e.decode().map_err(DocxServerError::format)?;
                    let text = quick_xml::escape::unescape(&raw).map_err(DocxServerError::format)?;
                    state.text(&text);
                }
            }
            Event::CData(e) => {
                if state.skip_depth == 0 && state.in_text {
                    let text = e.decode().map_err(DocxServerError::format)?;
                    state.text(&text);
                }
            }
            Event::GeneralRef(e) => {
                if state.skip_depth == 0 && state.in_text {
                    let name = e.decode().map_err(DocxServerError::format)?;
                    let resolved = resolve_reference(&name)?;
                    state.text(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_body {
        return Err(DocxServerError::Format(
            "document part has no w:body element".to_string(),
        ));
    }
    Ok(state.blocks)
}

#[derive(Default)]
struct StyleBuilder {
    id: Option<String>,
    name: Option<String>,
    kind: Option<StyleKind>,
    based_on: Option<String>,
    formatting: RunFormatting,
    is_default: bool,
}

impl StyleBuilder {
    fn build(self) -> Option<Style> {
        let id = self.id?;
        Some(Style {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            kind: self.kind?,
            based_on: self.based_on,
            formatting: self.formatting,
            is_default: self.is_default,
        })
    }
}

/// Parse `word/styles.xml` into style definitions.
///
/// Numbering styles and styles without an id are dropped.
pub(crate) fn read_styles(xml: &str) -> Result<Vec<Style>> {
    let mut reader = Reader::from_str(xml);
    let mut styles = Vec::new();
    let mut current: Option<StyleBuilder> = None;
    // Only the style's own rPr counts; rPr nested in tblStylePr is conditional.
    let mut depth_in_style = 0usize;
    let mut in_run_props = false;

    loop {
        let event = reader.read_event().map_err(DocxServerError::format)?;
        let (e, empty) = match &event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(e) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"style" => {
                        if let Some(style) = current.take().and_then(StyleBuilder::build) {
                            styles.push(style);
                        }
                        depth_in_style = 0;
                    }
                    b"rPr" if depth_in_style == 2 => in_run_props = false,
                    _ => {}
                }
                if current.is_some() {
                    depth_in_style = depth_in_style.saturating_sub(1);
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        let local = e.local_name();
        let name = local.as_ref();

        if name == b"style" {
            current = Some(StyleBuilder {
                id: attr(e, b"styleId")?,
                kind: attr(e, b"type")?.as_deref().and_then(StyleKind::parse),
                is_default: matches!(attr(e, b"default")?.as_deref(), Some("1" | "true")),
                ..Default::default()
            });
            depth_in_style = if empty { 0 } else { 1 };
            if empty {
                if let Some(style) = current.take().and_then(StyleBuilder::build) {
                    styles.push(style);
                }
            }
            continue;
        }

        if let Some(style) = current.as_mut() {
            if in_run_props {
                apply_run_property(name, e, &mut style.formatting)?;
            } else if depth_in_style == 1 {
                match name {
                    b"name" => style.name = attr(e, b"val")?,
                    b"basedOn" => style.based_on = attr(e, b"val")?,
                    b"rPr" if !empty => in_run_props = true,
                    _ => {}
                }
            }
            if !empty {
                depth_in_style += 1;
            }
        }
    }

    Ok(styles)
}

/// Target of the first relationship whose type ends with `/kind`.
pub(crate) fn relationship_target(xml: &str, kind: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    let suffix = format!("/{kind}");

    loop {
        match reader.read_event().map_err(DocxServerError::format)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let matches = attr(&e, b"Type")?.is_some_and(|t| t.ends_with(&suffix));
                if matches {
                    return attr(&e, b"Target");
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Internal image relationships of a part, target by id.
pub(crate) fn image_targets(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event().map_err(DocxServerError::format)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let is_image = attr(&e, b"Type")?.is_some_and(|t| t.ends_with("/image"));
                let external = attr(&e, b"TargetMode")?.as_deref() == Some("External");
                if is_image && !external {
                    if let (Some(id), Some(target)) = (attr(&e, b"Id")?, attr(&e, b"Target")?) {
                        targets.insert(id, target);
                    }
                }
            }
            Event::Eof => return Ok(targets),
            _ => {}
        }
    }
}
