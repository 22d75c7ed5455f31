//! # Host Facade
//!
//! [`NotesApi`] is what a UI host talks to. It owns the note list and one
//! [`EditingSession`], and wires the host's actions to them in the required
//! order: every action that leaves the current note (select, new, rename)
//! flushes it first through the session.
//!
//! Like the command layer it never prints anything; results and failures are
//! returned to the host to render.
//!
//! ## Generic Over Store and Engine
//!
//! `NotesApi<S, E>` is generic over both seams:
//! - Production: `NotesApi<FileStore, MarkupEngine>`
//! - Testing: `NotesApi<InMemoryStore, MarkupEngine>`

use crate::error::Result;
use crate::engine::RichTextEngine;
use crate::keymap::{KeyChord, Keymap, Shortcut};
use crate::model::NoteRef;
use crate::session::{EditingSession, SessionTiming};
use crate::commands::helpers::next_default_title;
use crate::store::{with_store, ContentStore, SharedStore};
use std::sync::Arc;

/// What a keyboard shortcut did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutOutcome {
    Created(NoteRef),
    LinkOpened,
    LinkClosed,
    /// The host must ask the user before calling [`NotesApi::delete_note`].
    ConfirmDelete(NoteRef),
    Ignored,
}

pub struct NotesApi<S, E> {
    store: SharedStore<S>,
    session: EditingSession<S, E>,
    notes: Vec<NoteRef>,
    keys: Keymap,
}

impl<S, E> NotesApi<S, E>
where
    S: ContentStore + Send + 'static,
    E: RichTextEngine,
{
    pub fn new(store: SharedStore<S>, timing: SessionTiming, keys: Keymap) -> Self {
        let session = EditingSession::new(Arc::clone(&store), timing);
        Self {
            store,
            session,
            notes: Vec::new(),
            keys,
        }
    }

    pub fn notes(&self) -> &[NoteRef] {
        &self.notes
    }

    pub fn active(&self) -> Option<&NoteRef> {
        self.session.active()
    }

    pub fn session(&self) -> &EditingSession<S, E> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditingSession<S, E> {
        &mut self.session
    }

    pub fn refresh_notes(&mut self) -> Result<&[NoteRef]> {
        self.notes = with_store(&self.store, |store| store.list())?;
        Ok(&self.notes)
    }

    pub async fn select_note(&mut self, note: &NoteRef) -> Result<()> {
        match self.session.switch_to(note.clone()).await {
            Err(e) if e.is_not_found() => {
                log::debug!("{} vanished from the store, refreshing list", note.id);
                self.refresh_notes()?;
                Err(e)
            }
            other => other,
        }
    }

    pub async fn new_note(&mut self) -> Result<NoteRef> {
        let notes = with_store(&self.store, |store| store.list())?;
        let title = next_default_title(&notes);
        let note = self.session.new_document(&title).await?;
        self.refresh_notes()?;
        Ok(note)
    }

    pub fn rename_note(&mut self, note: &NoteRef, new_title: &str) -> Result<NoteRef> {
        self.session.flush_active()?;

        let new_title = new_title.trim();
        let new_id = with_store(&self.store, |store| store.rename(&note.id, new_title))?;
        let renamed = NoteRef::new(new_id, new_title);

        if self.session.active().is_some_and(|active| active.id == note.id) {
            self.session.retarget(renamed.clone());
        }
        self.refresh_notes()?;
        Ok(renamed)
    }

    /// Delete without asking. Confirmation is the host's job.
    pub fn delete_note(&mut self, note: &NoteRef) -> Result<()> {
        let was_active = self.session.active().is_some_and(|active| active.id == note.id);
        if was_active {
            // Drop pending edits so the timer cannot recreate the file.
            self.session.close();
        }
        with_store(&self.store, |store| store.delete(&note.id))?;
        self.refresh_notes()?;
        Ok(())
    }

    pub fn flush_active(&mut self) -> Result<()> {
        self.session.flush_active().map(|_| ())
    }

    pub fn dispose(&mut self) {
        self.session.dispose();
    }

    pub async fn handle_shortcut(&mut self, chord: &KeyChord) -> Result<ShortcutOutcome> {
        let Some(shortcut) = self.keys.resolve(chord) else {
            return Ok(ShortcutOutcome::Ignored);
        };
        log::debug!("{} -> {:?}", chord, shortcut);

        match shortcut {
            Shortcut::NewNote => Ok(ShortcutOutcome::Created(self.new_note().await?)),
            Shortcut::ToggleLink => {
                if self.session.link_flow().is_open() {
                    self.session.cancel_link();
                    Ok(ShortcutOutcome::LinkClosed)
                } else if self.session.capture_link().is_some() {
                    Ok(ShortcutOutcome::LinkOpened)
                } else {
                    Ok(ShortcutOutcome::Ignored)
                }
            }
            Shortcut::DeleteNote => Ok(match self.session.active() {
                Some(note) => ShortcutOutcome::ConfirmDelete(note.clone()),
                None => ShortcutOutcome::Ignored,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MarkupEngine;
    use crate::error::JotterError;
    use crate::model::{Document, NoteId};
    use crate::store::memory::InMemoryStore;
    use crate::store::shared;
    use std::time::Duration;
    use tokio::time::sleep;

    type Api = NotesApi<InMemoryStore, MarkupEngine>;

    fn api_with(store: InMemoryStore) -> (SharedStore<InMemoryStore>, Api) {
        let store = shared(store);
        let mut api = NotesApi::new(Arc::clone(&store), SessionTiming::default(), Keymap::default());
        api.refresh_notes().unwrap();
        (store, api)
    }

    fn note(title: &str) -> NoteRef {
        NoteRef::new(title, title)
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_note_picks_free_title_and_activates() {
        let (store, mut api) = api_with(InMemoryStore::new().with_note("New note 2", "<p>x</p>"));

        let created = api.new_note().await.unwrap();

        assert_eq!(created.title, "New note 3");
        assert_eq!(api.active(), Some(&created));
        assert_eq!(api.notes().len(), 2);
        assert_eq!(
            store.lock().unwrap().peek(&created.id),
            Some(&Document::empty())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_missing_note_refreshes_list() {
        let (store, mut api) = api_with(InMemoryStore::new().with_note("a", "").with_note("b", ""));
        store.lock().unwrap().delete(&NoteId::from("b")).unwrap();

        let err = api.select_note(&note("b")).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(api.notes(), &[note("a")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rename_active_note_keeps_editing_under_new_id() {
        let (store, mut api) = api_with(InMemoryStore::new().with_note("a", "<p>a</p>"));
        api.select_note(&note("a")).await.unwrap();
        api.session_mut().edit(|engine| engine.insert_text("1"));

        let renamed = api.rename_note(&note("a"), "b").unwrap();
        api.session_mut().edit(|engine| engine.insert_text("2"));
        sleep(Duration::from_millis(1100)).await;

        assert_eq!(api.active(), Some(&renamed));
        let store = store.lock().unwrap();
        assert!(store.peek(&NoteId::from("a")).is_none());
        assert_eq!(store.peek(&NoteId::from("b")).unwrap().as_str(), "<p>a12</p>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rename_collision_is_reported() {
        let (_store, mut api) = api_with(InMemoryStore::new().with_note("a", "").with_note("b", ""));
        let err = api.rename_note(&note("a"), "b").unwrap_err();
        assert!(matches!(err, JotterError::NameCollision(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_active_note_drops_pending_save() {
        let (store, mut api) = api_with(InMemoryStore::new().with_note("a", "<p>a</p>"));
        api.select_note(&note("a")).await.unwrap();
        api.session_mut().edit(|engine| engine.insert_text("!"));

        api.delete_note(&note("a")).unwrap();
        sleep(Duration::from_secs(5)).await;

        assert!(api.active().is_none());
        assert!(api.notes().is_empty());
        assert!(store.lock().unwrap().peek(&NoteId::from("a")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_other_note_keeps_session() {
        let (_store, mut api) = api_with(InMemoryStore::new().with_note("a", "").with_note("b", ""));
        api.select_note(&note("a")).await.unwrap();
        api.delete_note(&note("b")).unwrap();
        assert_eq!(api.active(), Some(&note("a")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shortcuts() {
        let (_store, mut api) = api_with(InMemoryStore::new());
        let unbound = api.handle_shortcut(&KeyChord::ctrl("q")).await.unwrap();
        assert_eq!(unbound, ShortcutOutcome::Ignored);

        let created = match api.handle_shortcut(&KeyChord::ctrl("n")).await.unwrap() {
            ShortcutOutcome::Created(note) => note,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(created.title, "New note 1");

        let link = KeyChord::ctrl("k");
        assert_eq!(api.handle_shortcut(&link).await.unwrap(), ShortcutOutcome::LinkOpened);
        assert_eq!(api.handle_shortcut(&link).await.unwrap(), ShortcutOutcome::LinkClosed);

        let delete: KeyChord = "Ctrl+Shift+D".parse().unwrap();
        assert_eq!(
            api.handle_shortcut(&delete).await.unwrap(),
            ShortcutOutcome::ConfirmDelete(created)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_shortcut_needs_focused_engine() {
        let (_store, mut api) = api_with(InMemoryStore::new().with_note("a", ""));
        assert_eq!(
            api.handle_shortcut(&KeyChord::ctrl("k")).await.unwrap(),
            ShortcutOutcome::Ignored
        );

        api.select_note(&note("a")).await.unwrap();
        api.session_mut().engine_mut().unwrap().blur();
        assert_eq!(
            api.handle_shortcut(&KeyChord::ctrl("k")).await.unwrap(),
            ShortcutOutcome::Ignored
        );
    }
}
