//! Paragraph text and run formatting tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Run, RunFormatting, RunRef};
use crate::state::DocumentStore;
use crate::tools::document::{insertion_index, InsertBlockResult};

// ============== Get Paragraph Text ==============

/// Parameters for reading a paragraph's text.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetParagraphTextParams {
    /// Document ID.
    pub document_id: String,
    /// Paragraph block index.
    pub index: usize,
}

/// Result of reading a paragraph's text.
#[derive(Debug, Serialize, JsonSchema)]
pub struct GetParagraphTextResult {
    /// Concatenated text of all runs.
    pub text: String,
}

/// Get the plain text of a paragraph.
pub fn get_paragraph_text(
    store: &DocumentStore,
    params: GetParagraphTextParams,
) -> Result<GetParagraphTextResult> {
    store.with_document(&params.document_id, |model| {
        Ok(GetParagraphTextResult {
            text: model.paragraph_text(params.index)?,
        })
    })
}

// ============== Get Paragraph ==============

/// Parameters for inspecting a paragraph.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetParagraphParams {
    /// Document ID.
    pub document_id: String,
    /// Paragraph block index.
    pub index: usize,
}

/// A run with its direct and effective formatting.
#[derive(Debug, Serialize, JsonSchema)]
pub struct RunInfo {
    /// Run index within the paragraph.
    pub index: usize,
    pub text: String,
    /// Formatting set directly on the run.
    pub formatting: RunFormatting,
    /// Formatting after applying the paragraph style chain.
    pub effective: RunFormatting,
}

/// Result of inspecting a paragraph.
#[derive(Debug, Serialize, JsonSchema)]
pub struct GetParagraphResult {
    /// Paragraph style id, if one is applied.
    pub style: Option<String>,
    pub text: String,
    /// Manual page breaks, as the index of the run each one precedes.
    /// A value equal to the run count means after the last run.
    pub page_breaks: Vec<usize>,
    pub runs: Vec<RunInfo>,
}

/// Get a paragraph's style, text and runs.
pub fn get_paragraph(
    store: &DocumentStore,
    params: GetParagraphParams,
) -> Result<GetParagraphResult> {
    store.with_document(&params.document_id, |model| {
        let paragraph = model.paragraph(params.index)?;
        let runs = paragraph
            .runs()
            .iter()
            .enumerate()
            .map(|(i, run)| {
                let effective = model.effective_formatting(RunRef {
                    paragraph: params.index,
                    run: i,
                })?;
                Ok(RunInfo {
                    index: i,
                    text: run.text().to_string(),
                    formatting: run.formatting().clone(),
                    effective,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GetParagraphResult {
            style: paragraph.style.clone(),
            text: paragraph.text(),
            page_breaks: paragraph.page_breaks().to_vec(),
            runs,
        })
    })
}

// ============== Add Run ==============

/// Parameters for appending a run.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AddRunParams {
    /// Document ID.
    pub document_id: String,
    /// Paragraph block index.
    pub paragraph: usize,
    /// Run text (must not be empty).
    pub text: String,
    /// Direct formatting for the run.
    #[serde(default)]
    pub formatting: RunFormatting,
}

/// Result of appending a run.
#[derive(Debug, Serialize, JsonSchema)]
pub struct AddRunResult {
    /// Reference to the new run.
    pub run: RunRef,
}

/// Append a formatted run to a paragraph.
pub fn add_run(store: &DocumentStore, params: AddRunParams) -> Result<AddRunResult> {
    store.with_document_mut(&params.document_id, |model| {
        let run = model.add_run(params.paragraph, &params.text, params.formatting)?;
        Ok(AddRunResult { run })
    })
}

// ============== Set Run Formatting ==============

/// Parameters for changing run formatting.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SetRunFormattingParams {
    /// Document ID.
    pub document_id: String,
    /// Run to update.
    pub run: RunRef,
    /// Fields to change; omitted fields keep their current value.
    pub formatting: RunFormatting,
}

/// Result of changing run formatting.
#[derive(Debug, Serialize, JsonSchema)]
pub struct SetRunFormattingResult {
    /// Direct formatting after the merge.
    pub formatting: RunFormatting,
}

/// Merge formatting into an existing run.
pub fn set_run_formatting(
    store: &DocumentStore,
    params: SetRunFormattingParams,
) -> Result<SetRunFormattingResult> {
    store.with_document_mut(&params.document_id, |model| {
        model.set_run_formatting(params.run, params.formatting)?;
        Ok(SetRunFormattingResult {
            formatting: model.run(params.run)?.formatting().clone(),
        })
    })
}

// ============== Add Styled Paragraph ==============

/// One run of a styled paragraph.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StyledRun {
    /// Run text (must not be empty).
    pub text: String,
    /// Direct formatting for the run.
    #[serde(default)]
    pub formatting: RunFormatting,
}

/// Parameters for adding a paragraph made of formatted runs.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AddStyledParagraphParams {
    /// Document ID.
    pub document_id: String,
    /// Runs in order.
    pub runs: Vec<StyledRun>,
    /// Paragraph style id or name.
    #[serde(default)]
    pub style: Option<String>,
    /// Block index to insert at. Omit to append.
    #[serde(default)]
    pub index: Option<usize>,
}

/// Insert a paragraph built from several formatted runs in one step.
///
/// Every run is validated first; one bad run rejects the whole paragraph.
pub fn add_styled_paragraph(
    store: &DocumentStore,
    params: AddStyledParagraphParams,
) -> Result<InsertBlockResult> {
    let runs = params
        .runs
        .into_iter()
        .map(|run| Run::new(run.text, run.formatting))
        .collect::<Result<Vec<_>>>()?;

    store.with_document_mut(&params.document_id, |model| {
        let index = insertion_index(model, params.index);
        let index = model.insert_paragraph_with_runs(index, runs, params.style.as_deref())?;
        Ok(InsertBlockResult {
            index,
            block_count: model.len(),
        })
    })
}
