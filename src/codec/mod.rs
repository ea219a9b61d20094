//! Document file codecs.
//!
//! A codec turns bytes into a [`DocumentModel`] and back. The file-level
//! `load`/`save` helpers are shared by all codecs.

pub mod docx;
mod reader;
mod writer;

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{DocxServerError, Result};
use crate::model::DocumentModel;

pub use docx::DocxCodec;

/// Reads and writes one on-disk document format.
pub trait DocumentCodec: Send + Sync {
    /// Parse file content. Rejected content is a `Format` error.
    fn decode(&self, bytes: &[u8]) -> Result<DocumentModel>;

    /// Serialize a model to file content.
    fn encode(&self, model: &DocumentModel) -> Result<Vec<u8>>;

    /// Load a document from `path`.
    fn load(&self, path: &Path) -> Result<DocumentModel> {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DocxServerError::NotFound(path.display().to_string()),
            _ => DocxServerError::IoError(e),
        })?;
        self.decode(&bytes)
    }

    /// Write a document to `path`, creating parent directories as needed.
    fn save(&self, model: &DocumentModel, path: &Path) -> Result<()> {
        let bytes = self.encode(model)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = DocxCodec.load(&dir.path().join("missing.docx"));
        assert!(matches!(result, Err(DocxServerError::NotFound(_))));
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("out.docx");
        DocxCodec.save(&DocumentModel::new(), &path).unwrap();
        assert!(path.exists());
    }
}
