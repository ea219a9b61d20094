//! Picture tools.

use std::fs;
use std::io;

use base64::Engine;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{DocxServerError, Result};
use crate::model::Picture;
use crate::state::DocumentStore;
use crate::tools::document::insertion_index;

/// Image to embed: a file path or base64-encoded content.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ImageSource {
    /// Image file on disk.
    FilePath {
        /// Path to a PNG, JPEG, GIF or BMP file (relative paths use the documents directory).
        #[serde(alias = "image_path")]
        path: String,
    },
    /// Base64-encoded image content.
    Base64 {
        /// Base64-encoded image bytes.
        base64: String,
    },
}

impl ImageSource {
    fn read(&self, store: &DocumentStore) -> Result<Vec<u8>> {
        match self {
            ImageSource::FilePath { path } => {
                let path = store.config().resolve_path(path)?;
                fs::read(&path).map_err(|e| match e.kind() {
                    io::ErrorKind::NotFound => {
                        DocxServerError::NotFound(path.display().to_string())
                    }
                    _ => DocxServerError::IoError(e),
                })
            }
            ImageSource::Base64 { base64 } => {
                Ok(base64::engine::general_purpose::STANDARD.decode(base64.trim())?)
            }
        }
    }
}

// ============== Add Picture ==============

/// Parameters for adding a picture.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AddPictureParams {
    /// Document ID.
    pub document_id: String,
    /// Image source (file path or base64 content).
    pub source: ImageSource,
    /// Display width in inches. With only one side given, the other keeps the aspect ratio.
    #[serde(default, alias = "width_inch")]
    pub width_inches: Option<f64>,
    /// Display height in inches.
    #[serde(default, alias = "height_inch")]
    pub height_inches: Option<f64>,
    /// Block index to insert at. Omit to append.
    #[serde(default)]
    pub index: Option<usize>,
}

/// Result of adding a picture.
#[derive(Debug, Serialize, JsonSchema)]
pub struct AddPictureResult {
    /// Block index of the picture.
    pub index: usize,
    pub block_count: usize,
    /// Final display size in inches.
    pub width_inches: f64,
    pub height_inches: f64,
}

/// Insert an image as its own block.
pub fn add_picture(store: &DocumentStore, params: AddPictureParams) -> Result<AddPictureResult> {
    let data = params.source.read(store)?;
    let picture = Picture::from_image(data, params.width_inches, params.height_inches)?;
    let (width_inches, height_inches) = (picture.width_inches(), picture.height_inches());

    store.with_document_mut(&params.document_id, |model| {
        let index = insertion_index(model, params.index);
        let index = model.insert_picture(index, picture)?;
        Ok(AddPictureResult {
            index,
            block_count: model.len(),
            width_inches,
            height_inches,
        })
    })
}
