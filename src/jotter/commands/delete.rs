use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::ContentStore;

use super::helpers::resolve_title;

pub fn run<S: ContentStore>(store: &mut S, titles: &[String]) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    for title in titles {
        let note = resolve_title(store, title)?;
        store.delete(&note.id)?;
        result.add_message(CmdMessage::success(format!("Note deleted: {}", note.title)));
        result.affected_notes.push(note);
    }

    Ok(result)
}
