//! The in-memory document: an ordered sequence of blocks plus a style sheet.
//!
//! Every mutator validates all of its inputs before touching `blocks`, so a
//! failed call leaves the document exactly as it was.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{DocxServerError, Result};
use crate::model::{Paragraph, Picture, Run, RunFormatting, StyleKind, StyleSheet, Table};

/// A top-level document element.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Picture(Picture),
}

impl Block {
    fn kind_name(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::Table(_) => "table",
            Block::Picture(_) => "picture",
        }
    }
}

/// Kind of a block, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    PageBreak,
    Table,
    Picture,
}

/// One entry of `list_blocks`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct BlockSummary {
    /// Position in reading order.
    pub index: usize,
    pub kind: BlockKind,
    /// Paragraph or table style id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Paragraph text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Number of runs (paragraphs only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_count: Option<usize>,
    /// Table row count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    /// Table column count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cols: Option<usize>,
    /// Picture width in inches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_inches: Option<f64>,
    /// Picture height in inches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_inches: Option<f64>,
}

/// Position of a run: paragraph block index plus run index inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunRef {
    /// Block index of the paragraph.
    pub paragraph: usize,
    /// Run index within the paragraph.
    pub run: usize,
}

/// A Word document's structure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentModel {
    blocks: Vec<Block>,
    styles: StyleSheet,
}

impl DocumentModel {
    /// Empty document with the built-in style sheet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(blocks: Vec<Block>, styles: StyleSheet) -> Self {
        Self { blocks, styles }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    // ============== Queries ==============

    pub fn block(&self, index: usize) -> Result<&Block> {
        self.blocks.get(index).ok_or_else(|| {
            DocxServerError::invalid_index(format!(
                "block {} does not exist (document has {} blocks)",
                index,
                self.blocks.len()
            ))
        })
    }

    pub fn paragraph(&self, index: usize) -> Result<&Paragraph> {
        match self.block(index)? {
            Block::Paragraph(paragraph) => Ok(paragraph),
            other => Err(wrong_kind(index, other.kind_name(), "paragraph")),
        }
    }

    pub fn table(&self, index: usize) -> Result<&Table> {
        match self.block(index)? {
            Block::Table(table) => Ok(table),
            other => Err(wrong_kind(index, other.kind_name(), "table")),
        }
    }

    pub fn paragraph_text(&self, index: usize) -> Result<String> {
        Ok(self.paragraph(index)?.text())
    }

    /// `(rows, cols)` of the table at `index`.
    pub fn table_dimensions(&self, index: usize) -> Result<(usize, usize)> {
        let table = self.table(index)?;
        Ok((table.row_count(), table.column_count()))
    }

    pub fn cell_text(&self, table: usize, row: usize, col: usize) -> Result<String> {
        Ok(self.table(table)?.cell(row, col)?.text())
    }

    pub fn list_blocks(&self) -> Vec<BlockSummary> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, block)| match block {
                Block::Paragraph(p) => BlockSummary {
                    index,
                    kind: if p.is_page_break() {
                        BlockKind::PageBreak
                    } else {
                        BlockKind::Paragraph
                    },
                    style: p.style.clone(),
                    text: Some(p.text()),
                    run_count: Some(p.runs().len()),
                    rows: None,
                    cols: None,
                    width_inches: None,
                    height_inches: None,
                },
                Block::Table(t) => BlockSummary {
                    index,
                    kind: BlockKind::Table,
                    style: t.style.clone(),
                    text: None,
                    run_count: None,
                    rows: Some(t.row_count()),
                    cols: Some(t.column_count()),
                    width_inches: None,
                    height_inches: None,
                },
                Block::Picture(picture) => BlockSummary {
                    index,
                    kind: BlockKind::Picture,
                    style: None,
                    text: None,
                    run_count: None,
                    rows: None,
                    cols: None,
                    width_inches: Some(picture.width_inches()),
                    height_inches: Some(picture.height_inches()),
                },
            })
            .collect()
    }

    pub fn run(&self, run_ref: RunRef) -> Result<&Run> {
        let paragraph = self.paragraph(run_ref.paragraph)?;
        paragraph
            .runs()
            .get(run_ref.run)
            .ok_or_else(|| missing_run(run_ref, paragraph.runs().len()))
    }

    /// Formatting a run actually renders with: its paragraph's style chain
    /// overlaid by the run's own settings.
    pub fn effective_formatting(&self, run_ref: RunRef) -> Result<RunFormatting> {
        let paragraph = self.paragraph(run_ref.paragraph)?;
        let run = self.run(run_ref)?;
        let mut formatting = self
            .styles
            .formatting_for(paragraph.style.as_deref(), StyleKind::Paragraph);
        formatting.merge(run.formatting());
        Ok(formatting)
    }

    // ============== Mutators ==============

    /// Insert a paragraph at `index` (`len` appends). Returns its index.
    pub fn insert_paragraph(
        &mut self,
        index: usize,
        text: &str,
        style: Option<&str>,
    ) -> Result<usize> {
        self.check_insert_index(index)?;
        let style = self.resolve_style(style, StyleKind::Paragraph)?;
        let paragraph = Paragraph::with_text(text, style)?;
        self.blocks.insert(index, Block::Paragraph(paragraph));
        Ok(index)
    }

    /// Insert a paragraph built from pre-validated runs. Nothing is inserted
    /// when the index or style is rejected.
    pub fn insert_paragraph_with_runs(
        &mut self,
        index: usize,
        runs: Vec<Run>,
        style: Option<&str>,
    ) -> Result<usize> {
        self.check_insert_index(index)?;
        let style = self.resolve_style(style, StyleKind::Paragraph)?;
        let mut paragraph = Paragraph::new(style);
        for run in runs {
            paragraph.push_run(run);
        }
        self.blocks.insert(index, Block::Paragraph(paragraph));
        Ok(index)
    }

    /// Insert a manual page break at `index`.
    pub fn insert_page_break(&mut self, index: usize) -> Result<usize> {
        self.check_insert_index(index)?;
        self.blocks
            .insert(index, Block::Paragraph(Paragraph::page_break()));
        Ok(index)
    }

    /// Insert a picture as its own block at `index`.
    pub fn insert_picture(&mut self, index: usize, picture: Picture) -> Result<usize> {
        self.check_insert_index(index)?;
        self.blocks.insert(index, Block::Picture(picture));
        Ok(index)
    }

    pub fn delete_block(&mut self, index: usize) -> Result<Block> {
        self.block(index)?;
        Ok(self.blocks.remove(index))
    }

    /// Move the block at `from` so that it ends up at position `to`.
    pub fn move_block(&mut self, from: usize, to: usize) -> Result<()> {
        self.block(from)?;
        if to >= self.blocks.len() {
            return Err(DocxServerError::invalid_index(format!(
                "target position {} is out of range (valid: 0-{})",
                to,
                self.blocks.len() - 1
            )));
        }
        let block = self.blocks.remove(from);
        self.blocks.insert(to, block);
        Ok(())
    }

    pub fn add_run(
        &mut self,
        paragraph: usize,
        text: &str,
        formatting: RunFormatting,
    ) -> Result<RunRef> {
        self.paragraph(paragraph)?;
        let run = Run::new(text, formatting)?;
        let run = self.paragraph_mut(paragraph)?.push_run(run);
        Ok(RunRef { paragraph, run })
    }

    /// Merge `formatting` into the run's formatting; unset fields are kept.
    pub fn set_run_formatting(&mut self, run_ref: RunRef, formatting: RunFormatting) -> Result<()> {
        self.run(run_ref)?;
        let formatting = formatting.normalized()?;
        let paragraph = self.paragraph_mut(run_ref.paragraph)?;
        let run = paragraph
            .runs_mut()
            .get_mut(run_ref.run)
            .ok_or_else(|| DocxServerError::internal("run vanished after validation"))?;
        run.formatting_mut().merge(&formatting);
        Ok(())
    }

    pub fn set_paragraph_style(&mut self, index: usize, style: &str) -> Result<()> {
        self.paragraph(index)?;
        let style = self.resolve_style(Some(style), StyleKind::Paragraph)?;
        self.paragraph_mut(index)?.style = style;
        Ok(())
    }

    /// Insert a `rows` x `cols` table at `index`, optionally filled with `data`.
    pub fn add_table(
        &mut self,
        index: usize,
        rows: usize,
        cols: usize,
        style: Option<&str>,
        data: Option<&[Vec<String>]>,
    ) -> Result<usize> {
        self.check_insert_index(index)?;
        let style = self.resolve_style(style, StyleKind::Table)?;
        let mut table = Table::new(rows, cols, style)?;
        if let Some(data) = data {
            table.fill(data)?;
        }
        self.blocks.insert(index, Block::Table(table));
        Ok(index)
    }

    /// Append a row to a table. Returns the new row index.
    pub fn add_table_row(&mut self, table: usize, values: Option<&[String]>) -> Result<usize> {
        self.table_mut(table)?.push_row(values)
    }

    pub fn set_cell_text(&mut self, table: usize, row: usize, col: usize, text: &str) -> Result<()> {
        self.table_mut(table)?.set_cell_text(row, col, text)
    }

    // ============== Helpers ==============

    fn paragraph_mut(&mut self, index: usize) -> Result<&mut Paragraph> {
        match self.blocks.get_mut(index) {
            Some(Block::Paragraph(paragraph)) => Ok(paragraph),
            Some(other) => Err(wrong_kind(index, other.kind_name(), "paragraph")),
            None => Err(DocxServerError::invalid_index(format!(
                "block {index} does not exist"
            ))),
        }
    }

    fn table_mut(&mut self, index: usize) -> Result<&mut Table> {
        match self.blocks.get_mut(index) {
            Some(Block::Table(table)) => Ok(table),
            Some(other) => Err(wrong_kind(index, other.kind_name(), "table")),
            None => Err(DocxServerError::invalid_index(format!(
                "block {index} does not exist"
            ))),
        }
    }

    fn check_insert_index(&self, index: usize) -> Result<()> {
        if index > self.blocks.len() {
            return Err(DocxServerError::invalid_index(format!(
                "insertion point {} is out of range (valid: 0-{})",
                index,
                self.blocks.len()
            )));
        }
        Ok(())
    }

    fn resolve_style(&self, name: Option<&str>, kind: StyleKind) -> Result<Option<String>> {
        name.map(|name| self.styles.resolve(name, kind).map(|s| s.id.clone()))
            .transpose()
    }
}

fn wrong_kind(index: usize, found: &str, expected: &str) -> DocxServerError {
    DocxServerError::invalid_index(format!("block {index} is a {found}, not a {expected}"))
}

fn missing_run(run_ref: RunRef, count: usize) -> DocxServerError {
    DocxServerError::invalid_index(format!(
        "run {} does not exist in paragraph {} ({} runs)",
        run_ref.run, run_ref.paragraph, count
    ))
}
