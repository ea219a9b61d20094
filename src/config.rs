//! Server configuration, read from the environment.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{DocxServerError, Result};

/// Directory for relative document paths.
pub const DOCUMENTS_DIR_VAR: &str = "DOCX_MCP_DOCUMENTS_DIR";
/// Maximum number of simultaneously open documents.
pub const MAX_DOCUMENTS_VAR: &str = "DOCX_MCP_MAX_DOCUMENTS";

const DEFAULT_DOCUMENTS_DIR: &str = "documents";
const DEFAULT_MAX_DOCUMENTS: usize = 64;

/// Document store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Base directory for relative paths passed to open/save.
    pub documents_dir: PathBuf,
    /// Open-handle limit; `create`/`open` fail beyond it.
    pub max_documents: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from(DEFAULT_DOCUMENTS_DIR),
            max_documents: DEFAULT_MAX_DOCUMENTS,
        }
    }
}

impl ServerConfig {
    /// Read settings from `DOCX_MCP_*` variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = lookup(DOCUMENTS_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            config.documents_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup(MAX_DOCUMENTS_VAR) {
            config.max_documents = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    DocxServerError::validation(format!(
                        "{MAX_DOCUMENTS_VAR} must be a positive integer, got '{raw}'"
                    ))
                })?;
        }

        Ok(config)
    }

    /// Resolve a caller-supplied path against `documents_dir`.
    pub fn resolve_path(&self, path: &str) -> Result<PathBuf> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(DocxServerError::validation("path must not be empty"));
        }
        let candidate = Path::new(trimmed);
        if candidate.is_absolute() {
            Ok(candidate.to_path_buf())
        } else {
            Ok(self.documents_dir.join(candidate))
        }
    }
}
