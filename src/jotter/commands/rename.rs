use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::NoteRef;
use crate::store::ContentStore;

use super::helpers::resolve_title;

pub fn run<S: ContentStore>(store: &mut S, title: &str, new_title: &str) -> Result<CmdResult> {
    let note = resolve_title(store, title)?;
    let new_title = new_title.trim();
    let new_id = store.rename(&note.id, new_title)?;
    let renamed = NoteRef::new(new_id, new_title);

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Note renamed: {} -> {}",
        note.title, renamed.title
    )));
    Ok(result.with_affected_notes(vec![renamed]))
}
