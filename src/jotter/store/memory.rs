use super::{validate_title, ContentStore};
use crate::error::{JotterError, Result};
use crate::model::{Document, NoteId, NoteRef};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// One call made against an [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    List,
    Read(NoteId),
    Write(NoteId, Document),
    Rename(NoteId, String),
    Delete(NoteId),
}

/// In-memory storage for testing and development.
/// Does NOT persist data. Ids are the titles themselves.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    notes: BTreeMap<NoteId, Document>,
    journal: RefCell<Vec<StoreOp>>,
    fail_writes: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a note without touching the journal.
    pub fn with_note(mut self, title: &str, markup: &str) -> Self {
        self.notes.insert(NoteId::from(title), Document::new(markup));
        self
    }

    /// Make every following `write` fail until switched off again.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn journal(&self) -> Vec<StoreOp> {
        self.journal.borrow().clone()
    }

    pub fn clear_journal(&mut self) {
        self.journal.get_mut().clear();
    }

    fn record(&self, op: StoreOp) {
        self.journal.borrow_mut().push(op);
    }

    /// Successful writes recorded in the journal, oldest first.
    pub fn writes(&self) -> Vec<(NoteId, Document)> {
        self.journal
            .borrow()
            .iter()
            .filter_map(|op| match op {
                StoreOp::Write(id, doc) => Some((id.clone(), doc.clone())),
                _ => None,
            })
            .collect()
    }

    /// Current content without recording a read.
    pub fn peek(&self, id: &NoteId) -> Option<&Document> {
        self.notes.get(id)
    }
}

impl ContentStore for InMemoryStore {
    fn list(&self) -> Result<Vec<NoteRef>> {
        self.record(StoreOp::List);
        Ok(self
            .notes
            .keys()
            .map(|id| NoteRef::new(id.clone(), id.as_str()))
            .collect())
    }

    fn read(&self, id: &NoteId) -> Result<Document> {
        self.record(StoreOp::Read(id.clone()));
        self.notes
            .get(id)
            .cloned()
            .ok_or_else(|| JotterError::NotFound(id.clone()))
    }

    fn write(&mut self, id: &NoteId, document: &Document) -> Result<()> {
        if self.fail_writes {
            return Err(JotterError::WriteFailure {
                id: id.clone(),
                reason: "write rejected by store".to_string(),
            });
        }
        self.notes.insert(id.clone(), document.clone());
        self.record(StoreOp::Write(id.clone(), document.clone()));
        Ok(())
    }

    fn rename(&mut self, id: &NoteId, new_title: &str) -> Result<NoteId> {
        validate_title(new_title)?;
        if !self.notes.contains_key(id) {
            return Err(JotterError::NotFound(id.clone()));
        }
        let new_id = NoteId::from(new_title);
        if &new_id != id && self.notes.contains_key(&new_id) {
            return Err(JotterError::NameCollision(new_title.to_string()));
        }
        if let Some(doc) = self.notes.remove(id) {
            self.notes.insert(new_id.clone(), doc);
        }
        self.record(StoreOp::Rename(id.clone(), new_title.to_string()));
        Ok(new_id)
    }

    fn delete(&mut self, id: &NoteId) -> Result<()> {
        if self.notes.remove(id).is_none() {
            return Err(JotterError::NotFound(id.clone()));
        }
        self.record(StoreOp::Delete(id.clone()));
        Ok(())
    }

    fn reference_for(&self, title: &str) -> NoteRef {
        NoteRef::new(title, title)
    }

    fn exists(&self, id: &NoteId) -> Result<bool> {
        Ok(self.notes.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let mut store = InMemoryStore::new();
        let id = NoteId::from("a");
        store.write(&id, &Document::new("<p>a</p>")).unwrap();
        assert_eq!(store.read(&id).unwrap().as_str(), "<p>a</p>");
        assert_eq!(store.writes().len(), 1);
    }

    #[test]
    fn test_failed_write_keeps_previous_content() {
        let mut store = InMemoryStore::new().with_note("a", "<p>old</p>");
        store.fail_writes(true);
        let err = store
            .write(&NoteId::from("a"), &Document::new("<p>new</p>"))
            .unwrap_err();
        assert!(matches!(err, JotterError::WriteFailure { .. }));
        assert_eq!(store.peek(&NoteId::from("a")).unwrap().as_str(), "<p>old</p>");
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_rename_moves_content() {
        let mut store = InMemoryStore::new().with_note("a", "<p>x</p>");
        let new_id = store.rename(&NoteId::from("a"), "b").unwrap();
        assert_eq!(new_id, NoteId::from("b"));
        assert!(store.read(&NoteId::from("a")).is_err());
        assert_eq!(store.read(&new_id).unwrap().as_str(), "<p>x</p>");
    }

    #[test]
    fn test_list_is_ordered() {
        let store = InMemoryStore::new().with_note("b", "").with_note("a", "");
        let titles: Vec<_> = store.list().unwrap().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }
}
