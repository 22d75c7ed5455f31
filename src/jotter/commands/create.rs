use crate::commands::{CmdMessage, CmdResult};
use crate::error::{JotterError, Result};
use crate::model::Document;
use crate::store::{validate_title, ContentStore};

use super::helpers::next_default_title;

/// Create a note. Without a title the next free default title is used.
pub fn run<S: ContentStore>(
    store: &mut S,
    title: Option<String>,
    content: Option<String>,
) -> Result<CmdResult> {
    let title = match title {
        Some(title) => title.trim().to_string(),
        None => next_default_title(&store.list()?),
    };
    validate_title(&title)?;

    let note = store.reference_for(&title);
    if store.exists(&note.id)? {
        return Err(JotterError::NameCollision(title));
    }

    let document = content.map(Document::new).unwrap_or_default().normalized();
    store.write(&note.id, &document)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Note created: {}", note.title)));
    Ok(result.with_affected_notes(vec![note]))
}
