use crate::commands::CmdResult;
use crate::error::Result;
use crate::store::ContentStore;

use super::helpers::resolve_title;

pub fn run<S: ContentStore>(store: &S, titles: &[String]) -> Result<CmdResult> {
    let mut documents = Vec::with_capacity(titles.len());
    for title in titles {
        let note = resolve_title(store, title)?;
        let document = store.read(&note.id)?;
        documents.push((note, document));
    }
    Ok(CmdResult::default().with_documents(documents))
}
