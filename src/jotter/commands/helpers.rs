use crate::error::{JotterError, Result};
use crate::model::{default_title, NoteId, NoteRef};
use crate::store::ContentStore;

/// Find a note by title: exact match first, then a unique case-insensitive one.
pub fn resolve_title<S: ContentStore>(store: &S, query: &str) -> Result<NoteRef> {
    let notes = store.list()?;
    let query = query.trim();

    if let Some(note) = notes.iter().find(|note| note.title == query) {
        return Ok(note.clone());
    }

    let folded = query.to_lowercase();
    let mut matches = notes
        .into_iter()
        .filter(|note| note.title.to_lowercase() == folded);
    match (matches.next(), matches.next()) {
        (Some(note), None) => Ok(note),
        (Some(_), Some(_)) => Err(JotterError::Api(format!(
            "'{}' matches more than one note; use the exact title",
            query
        ))),
        (None, _) => Err(JotterError::NotFound(NoteId::from(query))),
    }
}

/// First free `New note N`, starting from one past the current note count.
pub fn next_default_title(notes: &[NoteRef]) -> String {
    let mut n = notes.len() + 1;
    loop {
        let title = default_title(n);
        if !notes.iter().any(|note| note.title == title) {
            return title;
        }
        n += 1;
    }
}
