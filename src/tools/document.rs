//! Block-level operations: listing, inserting, deleting and reordering
//! paragraphs, headings and page breaks, plus style lookup.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{DocxServerError, Result};
use crate::model::{BlockSummary, DocumentModel, StyleKind};
use crate::state::DocumentStore;

/// Highest heading level Word defines a built-in style for.
pub const MAX_HEADING_LEVEL: u8 = 9;

/// Resolve an optional insertion point; `None` appends.
pub(crate) fn insertion_index(model: &DocumentModel, index: Option<usize>) -> usize {
    index.unwrap_or_else(|| model.len())
}

/// Style id for a heading level: 0 is the title, 1-9 are Heading1-Heading9.
pub fn heading_style(level: u8) -> Result<String> {
    match level {
        0 => Ok("Title".to_string()),
        1..=MAX_HEADING_LEVEL => Ok(format!("Heading{level}")),
        _ => Err(DocxServerError::validation(format!(
            "heading level must be between 0 and {MAX_HEADING_LEVEL}, got {level}"
        ))),
    }
}

// ============== List Blocks ==============

/// Parameters for listing blocks.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListBlocksParams {
    /// Document ID.
    pub document_id: String,
}

/// Result of listing blocks.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ListBlocksResult {
    /// Blocks in reading order.
    pub blocks: Vec<BlockSummary>,
    /// Total number of blocks.
    pub count: usize,
}

/// List the top-level blocks of a document.
pub fn list_blocks(store: &DocumentStore, params: ListBlocksParams) -> Result<ListBlocksResult> {
    store.with_document(&params.document_id, |model| {
        let blocks = model.list_blocks();
        Ok(ListBlocksResult {
            count: blocks.len(),
            blocks,
        })
    })
}

// ============== Insert Paragraph ==============

/// Parameters for inserting a paragraph.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct InsertParagraphParams {
    /// Document ID.
    pub document_id: String,
    /// Paragraph text.
    #[serde(default)]
    pub text: String,
    /// Block index to insert at (0 = first). Omit to append.
    #[serde(default)]
    pub index: Option<usize>,
    /// Paragraph style id or name, e.g. "Heading1" or "List Bullet".
    #[serde(default)]
    pub style: Option<String>,
}

/// Result of inserting a block.
#[derive(Debug, Serialize, JsonSchema)]
pub struct InsertBlockResult {
    /// Index of the new block.
    pub index: usize,
    /// Block count after the insertion.
    pub block_count: usize,
}

/// Insert a paragraph of plain text.
pub fn insert_paragraph(
    store: &DocumentStore,
    params: InsertParagraphParams,
) -> Result<InsertBlockResult> {
    store.with_document_mut(&params.document_id, |model| {
        let index = insertion_index(model, params.index);
        let index = model.insert_paragraph(index, &params.text, params.style.as_deref())?;
        Ok(InsertBlockResult {
            index,
            block_count: model.len(),
        })
    })
}

// ============== Add Heading ==============

/// Parameters for adding a heading.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AddHeadingParams {
    /// Document ID.
    pub document_id: String,
    /// Heading text.
    pub text: String,
    /// Heading level: 0 for the document title, 1-9 for Heading1-Heading9.
    #[serde(default = "default_heading_level")]
    pub level: u8,
    /// Block index to insert at. Omit to append.
    #[serde(default)]
    pub index: Option<usize>,
}

fn default_heading_level() -> u8 {
    1
}

/// Add a heading paragraph.
pub fn add_heading(store: &DocumentStore, params: AddHeadingParams) -> Result<InsertBlockResult> {
    let style = heading_style(params.level)?;
    store.with_document_mut(&params.document_id, |model| {
        let index = insertion_index(model, params.index);
        let index = model.insert_paragraph(index, &params.text, Some(&style))?;
        Ok(InsertBlockResult {
            index,
            block_count: model.len(),
        })
    })
}

// ============== Add Page Break ==============

/// Parameters for adding a page break.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AddPageBreakParams {
    /// Document ID.
    pub document_id: String,
    /// Block index to insert at. Omit to append.
    #[serde(default)]
    pub index: Option<usize>,
}

/// Insert a manual page break.
pub fn add_page_break(
    store: &DocumentStore,
    params: AddPageBreakParams,
) -> Result<InsertBlockResult> {
    store.with_document_mut(&params.document_id, |model| {
        let index = insertion_index(model, params.index);
        let index = model.insert_page_break(index)?;
        Ok(InsertBlockResult {
            index,
            block_count: model.len(),
        })
    })
}

// ============== Delete Block ==============

/// Parameters for deleting a block.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DeleteBlockParams {
    /// Document ID.
    pub document_id: String,
    /// Index of the block to delete.
    pub index: usize,
}

/// Result of deleting a block.
#[derive(Debug, Serialize, JsonSchema)]
pub struct DeleteBlockResult {
    /// Block count after the deletion.
    pub block_count: usize,
}

/// Delete a paragraph, page break or table.
pub fn delete_block(
    store: &DocumentStore,
    params: DeleteBlockParams,
) -> Result<DeleteBlockResult> {
    store.with_document_mut(&params.document_id, |model| {
        model.delete_block(params.index)?;
        Ok(DeleteBlockResult {
            block_count: model.len(),
        })
    })
}

// ============== Move Block ==============

/// Parameters for moving a block.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MoveBlockParams {
    /// Document ID.
    pub document_id: String,
    /// Current index of the block.
    pub from: usize,
    /// Index the block should end up at.
    pub to: usize,
}

/// Result of moving a block.
#[derive(Debug, Serialize, JsonSchema)]
pub struct MoveBlockResult {
    /// New index of the moved block.
    pub index: usize,
}

/// Move a block to another position.
pub fn move_block(store: &DocumentStore, params: MoveBlockParams) -> Result<MoveBlockResult> {
    store.with_document_mut(&params.document_id, |model| {
        model.move_block(params.from, params.to)?;
        Ok(MoveBlockResult { index: params.to })
    })
}

// ============== Set Paragraph Style ==============

/// Parameters for restyling a paragraph.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SetParagraphStyleParams {
    /// Document ID.
    pub document_id: String,
    /// Paragraph block index.
    pub index: usize,
    /// Paragraph style id or name.
    pub style: String,
}

/// Result of restyling a paragraph.
#[derive(Debug, Serialize, JsonSchema)]
pub struct SetParagraphStyleResult {
    /// Resolved style id.
    pub style: String,
}

/// Apply a paragraph style.
pub fn set_paragraph_style(
    store: &DocumentStore,
    params: SetParagraphStyleParams,
) -> Result<SetParagraphStyleResult> {
    store.with_document_mut(&params.document_id, |model| {
        model.set_paragraph_style(params.index, &params.style)?;
        let style = model
            .paragraph(params.index)?
            .style
            .clone()
            .ok_or_else(|| DocxServerError::internal("style not recorded"))?;
        Ok(SetParagraphStyleResult { style })
    })
}

// ============== List Styles ==============

/// Parameters for listing styles.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListStylesParams {
    /// Document ID.
    pub document_id: String,
    /// Only styles of this kind: "paragraph", "character" or "table".
    #[serde(default)]
    pub kind: Option<String>,
}

/// One style definition.
#[derive(Debug, Serialize, JsonSchema)]
pub struct StyleEntry {
    /// Style id, used in the document XML.
    pub id: String,
    /// Display name.
    pub name: String,
    /// "paragraph", "character" or "table".
    pub kind: String,
    /// Parent style id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub based_on: Option<String>,
    /// Whether this is the default style of its kind.
    pub is_default: bool,
}

/// Result of listing styles.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ListStylesResult {
    pub styles: Vec<StyleEntry>,
}

/// List the styles defined in a document.
pub fn list_styles(store: &DocumentStore, params: ListStylesParams) -> Result<ListStylesResult> {
    let kind = params
        .kind
        .as_deref()
        .map(|raw| {
            StyleKind::parse(raw).ok_or_else(|| {
                DocxServerError::validation(format!(
                    "unknown style kind '{raw}' (expected paragraph, character or table)"
                ))
            })
        })
        .transpose()?;

    store.with_document(&params.document_id, |model| {
        let styles = model
            .styles()
            .styles()
            .iter()
            .filter(|style| kind.map_or(true, |k| style.kind == k))
            .map(|style| StyleEntry {
                id: style.id.clone(),
                name: style.name.clone(),
                kind: style.kind.as_str().to_string(),
                based_on: style.based_on.clone(),
                is_default: style.is_default,
            })
            .collect();
        Ok(ListStylesResult { styles })
    })
}
