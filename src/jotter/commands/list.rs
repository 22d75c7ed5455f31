use crate::commands::{CmdResult, NoteListing};
use crate::error::Result;
use crate::store::ContentStore;

const PREVIEW_CHARS: usize = 80;

pub fn run<S: ContentStore>(store: &S) -> Result<CmdResult> {
    let notes = store.list()?;
    let mut listed = Vec::with_capacity(notes.len());

    for note in notes {
        let preview = store
            .read(&note.id)?
            .plain_text()
            .chars()
            .take(PREVIEW_CHARS)
            .collect();
        let modified = store.modified(&note.id)?;
        listed.push(NoteListing {
            note,
            preview,
            modified,
        });
    }

    Ok(CmdResult::default().with_listed_notes(listed))
}
