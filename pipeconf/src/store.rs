//! In-memory document store.
//!
//! Documents are kept as immutable snapshots behind [`Arc`]. Replacing a
//! document swaps the snapshot, so a caller holding the previous one keeps
//! a consistent view.

use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashMap;
use tracing::{info, warn};

use crate::{
    document::{self, Document},
    registry::Registry,
};

/// Errors produced by [`Store`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No document is stored under the id.
    #[error("No document stored under id `{0}`")]
    DocumentNotFound(String),
    /// The text could not be loaded as a document.
    #[error(transparent)]
    Document(#[from] document::Error),
}

impl Error {
    /// Whether the failure was caused by the input rather than by us.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::DocumentNotFound(_) => true,
            Error::Document(err) => err.is_client_error(),
        }
    }
}

/// Documents keyed by id.
#[derive(Debug, Default)]
pub struct Store {
    documents: RwLock<FxHashMap<String, Arc<Document>>>,
}

impl Store {
    /// Create an empty [`Store`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `document` under `id`, replacing any previous document.
    pub fn put(&self, id: impl Into<String>, document: Document) {
        let id = id.into();
        info!(%id, nodes = document.len(), "stored document");
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(document));
    }

    /// The document stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentNotFound`] if nothing is stored under `id`.
    pub fn get(&self, id: &str) -> Result<Arc<Document>, Error> {
        let documents = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match documents.get(id) {
            Some(document) => Ok(Arc::clone(document)),
            None => {
                warn!(%id, "document not found");
                Err(Error::DocumentNotFound(id.to_string()))
            }
        }
    }

    /// Read `text` into a new document and store it under `id`. Nothing is
    /// stored if the text fails to load.
    ///
    /// # Errors
    ///
    /// Returns the document error if `text` is not a valid document.
    pub fn load(&self, id: impl Into<String>, registry: &Registry, text: &str) -> Result<(), Error> {
        let document = Document::from_text(registry, text)?;
        self.put(id, document);
        Ok(())
    }

    /// Ids of the stored documents, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort_unstable();
        ids
    }
}
