//! Session management tools: create, open, save, close, list, export.

use base64::Engine;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::DocumentStore;

/// Source for a document: either a file path or base64 content.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DocumentSource {
    /// Load document from a file path.
    FilePath {
        /// Path to the .docx file (relative paths use the documents directory).
        path: String,
    },
    /// Load document from base64-encoded content.
    Base64 {
        /// Base64-encoded .docx content.
        base64: String,
    },
}

impl DocumentSource {
    /// Open a document from this source into the store.
    pub fn open(&self, store: &DocumentStore) -> Result<String> {
        match self {
            DocumentSource::FilePath { path } => store.open(path),
            DocumentSource::Base64 { base64 } => {
                let bytes = base64::engine::general_purpose::STANDARD.decode(base64.trim())?;
                store.open_bytes(&bytes)
            }
        }
    }
}

// ============== Create Document ==============

/// Parameters for creating a document.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateDocumentParams {
    /// Default save path, used when save_document is called without a path.
    #[serde(default, alias = "filename")]
    pub path: Option<String>,
    /// Existing .docx to copy as the starting point.
    #[serde(default)]
    pub template: Option<String>,
}

/// Result of creating a document.
#[derive(Debug, Serialize, JsonSchema)]
pub struct CreateDocumentResult {
    /// Unique identifier for the new document.
    pub document_id: String,
    /// Bound save path, if any.
    pub path: Option<String>,
    /// Number of blocks (non-zero only for templates).
    pub block_count: usize,
}

/// Create a new document in memory.
pub fn create_document(
    store: &DocumentStore,
    params: CreateDocumentParams,
) -> Result<CreateDocumentResult> {
    let document_id = store.create(params.template.as_deref(), params.path.as_deref())?;
    let info = store.get_info(&document_id)?;

    Ok(CreateDocumentResult {
        document_id,
        path: info.path.map(|p| p.display().to_string()),
        block_count: info.block_count,
    })
}

// ============== Open Document ==============

/// Parameters for opening a document.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OpenDocumentParams {
    /// Document source (file path or base64 content).
    pub source: DocumentSource,
}

/// Result of opening a document.
#[derive(Debug, Serialize, JsonSchema)]
pub struct OpenDocumentResult {
    /// Unique identifier for the opened document.
    pub document_id: String,
    /// Path the document was loaded from (file sources only).
    pub path: Option<String>,
    /// Number of top-level blocks.
    pub block_count: usize,
}

/// Open an existing document.
pub fn open_document(
    store: &DocumentStore,
    params: OpenDocumentParams,
) -> Result<OpenDocumentResult> {
    let document_id = params.source.open(store)?;
    let info = store.get_info(&document_id)?;

    Ok(OpenDocumentResult {
        document_id,
        path: info.path.map(|p| p.display().to_string()),
        block_count: info.block_count,
    })
}

// ============== Save Document ==============

/// Parameters for saving a document.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SaveDocumentParams {
    /// Document ID.
    pub document_id: String,
    /// Target path; defaults to the path the document was opened from or last saved to.
    #[serde(default, alias = "filename")]
    pub path: Option<String>,
}

/// Result of saving a document.
#[derive(Debug, Serialize, JsonSchema)]
pub struct SaveDocumentResult {
    /// Path that was written.
    pub path: String,
}

/// Save a document to disk. The document stays open.
pub fn save_document(
    store: &DocumentStore,
    params: SaveDocumentParams,
) -> Result<SaveDocumentResult> {
    let path = store.save(&params.document_id, params.path.as_deref())?;
    Ok(SaveDocumentResult {
        path: path.display().to_string(),
    })
}

// ============== Export Document ==============

/// Parameters for exporting a document.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExportDocumentParams {
    /// Document ID.
    pub document_id: String,
}

/// Exported document content.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ExportDocumentResult {
    /// Base64-encoded .docx content.
    pub base64: String,
    /// Size of the decoded content in bytes.
    pub size: usize,
}

/// Encode a document as base64 .docx content without writing a file.
pub fn export_document(
    store: &DocumentStore,
    params: ExportDocumentParams,
) -> Result<ExportDocumentResult> {
    let bytes = store.export(&params.document_id)?;
    Ok(ExportDocumentResult {
        base64: base64::engine::general_purpose::STANDARD.encode(&bytes),
        size: bytes.len(),
    })
}

// ============== Close Document ==============

/// Parameters for closing a document.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CloseDocumentParams {
    /// Document ID to close.
    pub document_id: String,
}

/// Result of closing a document.
#[derive(Debug, Serialize, JsonSchema)]
pub struct CloseDocumentResult {
    /// Always true; closing is idempotent.
    pub success: bool,
    /// Whether an open document was released by this call.
    pub was_open: bool,
}

/// Close a document and free its memory. Unsaved changes are discarded.
pub fn close_document(
    store: &DocumentStore,
    params: CloseDocumentParams,
) -> Result<CloseDocumentResult> {
    let was_open = store.close(&params.document_id)?;
    Ok(CloseDocumentResult {
        success: true,
        was_open,
    })
}

// ============== List Documents ==============

/// Parameters for listing documents (none required).
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListDocumentsParams {}

/// Information about a single document.
#[derive(Debug, Serialize, JsonSchema)]
pub struct DocumentListEntry {
    /// Document ID.
    pub document_id: String,
    /// Bound save path, if any.
    pub path: Option<String>,
    /// Number of top-level blocks.
    pub block_count: usize,
    /// Whether there are unsaved changes.
    pub modified: bool,
    /// Seconds since the document was created or opened.
    pub age_seconds: u64,
}

/// Result of listing documents.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ListDocumentsResult {
    /// List of open documents.
    pub documents: Vec<DocumentListEntry>,
}

/// List all open documents.
pub fn list_documents(
    store: &DocumentStore,
    _params: ListDocumentsParams,
) -> Result<ListDocumentsResult> {
    let docs = store.list()?;
    let documents = docs
        .into_iter()
        .map(|info| DocumentListEntry {
            document_id: info.id,
            path: info.path.map(|p| p.display().to_string()),
            block_count: info.block_count,
            modified: info.modified,
            age_seconds: info.created_at.elapsed().as_secs(),
        })
        .collect();

    Ok(ListDocumentsResult { documents })
}
