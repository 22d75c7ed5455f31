//! # Storage Layer
//!
//! The [`ContentStore`] trait is the only way the rest of jotter reaches
//! persisted notes. It is deliberately small: list, read, write, rename and
//! delete, each resolving (or failing) before the caller issues the next one.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: one `<title>.html` file per note in a single directory.
//! - [`memory::InMemoryStore`]: map-backed store with an operation journal and
//!   write-failure injection, used by tests.
//!
//! ## Sharing
//!
//! The editing session hands the store to its debounce timer task, so stores
//! are shared as [`SharedStore`] (`Arc<Mutex<S>>`). The lock is only ever held
//! for the duration of a single store call and never across an `.await`.

use crate::error::{JotterError, Result};
use crate::model::{Document, NoteId, NoteRef};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

pub mod fs;
pub mod memory;

/// Abstract interface to the notes backend.
pub trait ContentStore {
    /// All notes, ordered by title. Empty when there are none.
    fn list(&self) -> Result<Vec<NoteRef>>;

    /// Read one document. Fails with `NotFound` for unknown ids.
    fn read(&self, id: &NoteId) -> Result<Document>;

    /// Create or overwrite a document.
    fn write(&mut self, id: &NoteId, document: &Document) -> Result<()>;

    /// Give a note a new title. Returns the new id; the old one stops resolving.
    fn rename(&mut self, id: &NoteId, new_title: &str) -> Result<NoteId>;

    /// Remove a note permanently.
    fn delete(&mut self, id: &NoteId) -> Result<()>;

    /// The reference a note with this title has (or would have) in this store.
    fn reference_for(&self, title: &str) -> NoteRef;

    fn exists(&self, id: &NoteId) -> Result<bool> {
        Ok(self.list()?.iter().any(|note| &note.id == id))
    }

    /// Last modification time, when the backend tracks one.
    fn modified(&self, _id: &NoteId) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }
}

pub type SharedStore<S> = Arc<Mutex<S>>;

pub fn shared<S: ContentStore>(store: S) -> SharedStore<S> {
    Arc::new(Mutex::new(store))
}

/// Run `f` with the store locked.
pub fn with_store<S, T>(store: &SharedStore<S>, f: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
    let mut guard = store
        .lock()
        .map_err(|_| JotterError::Store("content store lock poisoned".to_string()))?;
    f(&mut guard)
}

/// Titles become file names, so they must not contain path syntax.
pub fn validate_title(title: &str) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(JotterError::InvalidInput("Title cannot be empty".into()));
    }
    if trimmed.starts_with('.') {
        return Err(JotterError::InvalidInput(format!(
            "Title cannot start with '.': {}",
            title
        )));
    }
    if let Some(c) = title
        .chars()
        .find(|c| matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'))
    {
        return Err(JotterError::InvalidInput(format!(
            "Title cannot contain '{}'",
            c.escape_default()
        )));
    }
    Ok(())
}
