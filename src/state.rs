//! Document store mapping document ids to loaded documents.
//!
//! The map lock is only held long enough to look up or insert an entry. Each
//! document has its own lock, so operations on one document are serialized
//! while different documents proceed independently.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use uuid::Uuid;

use crate::codec::{DocumentCodec, DocxCodec};
use crate::config::ServerConfig;
use crate::error::{DocxServerError, Result};
use crate::model::DocumentModel;

/// Metadata about a stored document.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    /// Unique identifier for this document.
    pub id: String,
    /// Path the document was opened from or last saved to.
    pub path: Option<PathBuf>,
    /// Number of top-level blocks.
    pub block_count: usize,
    /// Changed since it was opened or last saved.
    pub modified: bool,
    /// When the document was created or opened.
    pub created_at: Instant,
    /// When the document was last accessed.
    pub last_accessed: Instant,
}

/// A stored document with its metadata.
pub struct StoredDocument {
    model: DocumentModel,
    path: Option<PathBuf>,
    modified: bool,
    closed: bool,
    id: String,
    created_at: Instant,
    last_accessed: Instant,
}

impl StoredDocument {
    fn new(model: DocumentModel, path: Option<PathBuf>) -> Self {
        let now = Instant::now();
        Self {
            model,
            path,
            modified: false,
            closed: false,
            id: Uuid::new_v4().to_string(),
            created_at: now,
            last_accessed: now,
        }
    }

    /// Update the last accessed timestamp.
    fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }

    fn info(&self) -> DocumentInfo {
        DocumentInfo {
            id: self.id.clone(),
            path: self.path.clone(),
            block_count: self.model.len(),
            modified: self.modified,
            created_at: self.created_at,
            last_accessed: self.last_accessed,
        }
    }
}

type DocumentEntry = Arc<Mutex<StoredDocument>>;

/// Thread-safe document store.
///
/// Created once at startup and drained with [`DocumentStore::close_all`] on
/// shutdown. Cloning shares the same underlying store.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<Mutex<DocumentStoreInner>>,
    codec: Arc<dyn DocumentCodec>,
    config: Arc<ServerConfig>,
}

struct DocumentStoreInner {
    documents: HashMap<String, DocumentEntry>,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    /// Create a new empty document store with default settings.
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a store using the DOCX codec.
    pub fn with_config(config: ServerConfig) -> Self {
        Self::with_codec(config, Arc::new(DocxCodec))
    }

    /// Create a store backed by a specific codec.
    pub fn with_codec(config: ServerConfig, codec: Arc<dyn DocumentCodec>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DocumentStoreInner {
                documents: HashMap::new(),
            })),
            codec,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, DocumentStoreInner>> {
        self.inner.lock().map_err(|e| {
            DocxServerError::internal(format!("Failed to lock document store: {}", e))
        })
    }

    fn lock_document<'a>(
        id: &str,
        entry: &'a DocumentEntry,
    ) -> Result<MutexGuard<'a, StoredDocument>> {
        let stored = entry.lock().map_err(|e| {
            DocxServerError::internal(format!("Failed to lock document {}: {}", id, e))
        })?;
        // Closed between lookup and lock.
        if stored.closed {
            return Err(DocxServerError::InvalidHandle(id.to_string()));
        }
        Ok(stored)
    }

    fn entry(&self, id: &str) -> Result<DocumentEntry> {
        self.lock_inner()?
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| DocxServerError::InvalidHandle(id.to_string()))
    }

    /// Register a model under a fresh id.
    fn insert(&self, model: DocumentModel, path: Option<PathBuf>) -> Result<String> {
        let stored = StoredDocument::new(model, path);
        let id = stored.id.clone();

        let mut inner = self.lock_inner()?;
        if inner.documents.len() >= self.config.max_documents {
            return Err(DocxServerError::ResourceExhausted(self.config.max_documents));
        }
        inner
            .documents
            .insert(id.clone(), Arc::new(Mutex::new(stored)));
        Ok(id)
    }

    /// Create a new document, empty or cloned from a template file.
    ///
    /// `path` binds a default save location without writing anything.
    pub fn create(&self, template: Option<&str>, path: Option<&str>) -> Result<String> {
        let path = path.map(|p| self.config.resolve_path(p)).transpose()?;
        let model = match template {
            Some(template) => self.codec.load(&self.config.resolve_path(template)?)?,
            None => DocumentModel::new(),
        };
        let id = self.insert(model, path)?;
        tracing::info!(document_id = %id, "Created document");
        Ok(id)
    }

    /// Load a document from disk. Nothing is registered if loading fails.
    pub fn open(&self, path: &str) -> Result<String> {
        let path = self.config.resolve_path(path)?;
        let model = self.codec.load(&path)?;
        let id = self.insert(model, Some(path.clone()))?;
        tracing::info!(document_id = %id, path = %path.display(), "Opened document");
        Ok(id)
    }

    /// Load a document from in-memory content. No save path is bound.
    pub fn open_bytes(&self, bytes: &[u8]) -> Result<String> {
        let model = self.codec.decode(bytes)?;
        let id = self.insert(model, None)?;
        tracing::info!(document_id = %id, size = bytes.len(), "Opened document from bytes");
        Ok(id)
    }

    /// Get document info without touching the model.
    pub fn get_info(&self, id: &str) -> Result<DocumentInfo> {
        let entry = self.entry(id)?;
        let stored = Self::lock_document(id, &entry)?;
        Ok(stored.info())
    }

    /// Execute a function with read access to a document.
    ///
    /// The document's lock is held for the duration of `f`.
    pub fn with_document<F, T>(&self, id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&DocumentModel) -> Result<T>,
    {
        let entry = self.entry(id)?;
        let mut stored = Self::lock_document(id, &entry)?;
        stored.touch();
        f(&stored.model)
    }

    /// Execute a function with exclusive mutable access to a document.
    ///
    /// The document is marked modified only when `f` succeeds.
    pub fn with_document_mut<F, T>(&self, id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut DocumentModel) -> Result<T>,
    {
        let entry = self.entry(id)?;
        let mut stored = Self::lock_document(id, &entry)?;
        stored.touch();
        let result = f(&mut stored.model)?;
        stored.modified = true;
        Ok(result)
    }

    /// Write a document through the codec and return the path written.
    ///
    /// An explicit `path` becomes the document's path for later saves.
    pub fn save(&self, id: &str, path: Option<&str>) -> Result<PathBuf> {
        let explicit = path.map(|p| self.config.resolve_path(p)).transpose()?;
        let entry = self.entry(id)?;
        let mut stored = Self::lock_document(id, &entry)?;

        let target = match explicit.or_else(|| stored.path.clone()) {
            Some(target) => target,
            None => return Err(DocxServerError::NoPath(id.to_string())),
        };

        self.codec.save(&stored.model, &target)?;
        stored.path = Some(target.clone());
        stored.modified = false;
        stored.touch();
        tracing::info!(document_id = %id, path = %target.display(), "Saved document");
        Ok(target)
    }

    /// Encode a document without writing it anywhere.
    pub fn export(&self, id: &str) -> Result<Vec<u8>> {
        self.with_document(id, |model| self.codec.encode(model))
    }

    /// Remove a document from the store.
    ///
    /// Closing an unknown or already-closed id is not an error; the return
    /// value tells whether a document was released.
    pub fn close(&self, id: &str) -> Result<bool> {
        let removed = self.lock_inner()?.documents.remove(id);
        let Some(entry) = removed else {
            tracing::debug!(document_id = %id, "Close of unknown document ignored");
            return Ok(false);
        };

        // Wait for in-flight operations on this document, then retire it.
        match entry.lock() {
            Ok(mut stored) => stored.closed = true,
            Err(poisoned) => poisoned.into_inner().closed = true,
        }
        tracing::info!(document_id = %id, "Closed document");
        Ok(true)
    }

    /// Close every document. Returns how many were open.
    pub fn close_all(&self) -> Result<usize> {
        let ids: Vec<String> = self.lock_inner()?.documents.keys().cloned().collect();
        let mut closed = 0;
        for id in ids {
            if self.close(&id)? {
                closed += 1;
            }
        }
        Ok(closed)
    }

    /// List all documents in the store, oldest first.
    pub fn list(&self) -> Result<Vec<DocumentInfo>> {
        let entries: Vec<(String, DocumentEntry)> = self
            .lock_inner()?
            .documents
            .iter()
            .map(|(id, entry)| (id.clone(), Arc::clone(entry)))
            .collect();

        let mut infos = Vec::with_capacity(entries.len());
        for (id, entry) in entries {
            match Self::lock_document(&id, &entry) {
                Ok(stored) => infos.push(stored.info()),
                Err(DocxServerError::InvalidHandle(_)) => {}
                Err(e) => return Err(e),
            }
        }
        infos.sort_by_key(|info| info.created_at);
        Ok(infos)
    }

    /// Get the number of documents in the store.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock_inner()?.documents.len())
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
