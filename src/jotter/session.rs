//! # Editing Session
//!
//! An [`EditingSession`] owns the one live rich-text engine of a host mount and
//! sits between it and the [`ContentStore`]. It enforces two rules:
//!
//! - **Flush before switch.** [`EditingSession::switch_to`] persists the
//!   outgoing document under its own id before the next document is read.
//!   If that write fails the switch is abandoned and the current document
//!   stays live.
//! - **Debounced autosave.** Every content change re-arms a single timer
//!   ([`EditingSession::on_user_edit`]); only the last state is written, once
//!   the user has been quiet for [`SessionTiming::quiet_period`].
//!
//! ## Timer Ownership
//!
//! The autosave timer is a spawned tokio task holding a clone of the shared
//! store, the note id and the document it was armed with. It is aborted on
//! re-arm, on `load`, after a successful flush, and on `dispose`. As a second
//! line, the task compares the load epoch it was armed under with the current
//! one and drops the write when a newer load happened, so a late timer can
//! never write one note's content under another note's id.
//!
//! Write failures from the timer are not returned to anyone; they are published
//! as [`SessionEvent::SaveFailed`] on the session's broadcast channel.
//!
//! ## Concurrency
//!
//! All engine mutations happen through `&mut self`, so there is exactly one
//! logical thread of control over the document. The host is expected to
//! serialize switch requests; the session does not queue them.

use crate::clipboard::{self, PasteEvent, PasteOutcome};
use crate::engine::RichTextEngine;
use crate::error::{JotterError, Result};
use crate::link::{LinkDraft, LinkFlow, LinkOutcome};
use crate::model::{Document, NoteId, NoteRef};
use crate::store::{validate_title, with_store, ContentStore, SharedStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// Inactivity required before an edit is written.
    pub quiet_period: Duration,
    /// Fallback wait for engines that do not report when a change is applied.
    pub settle_delay: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(500),
            settle_delay: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Loaded { note: NoteRef },
    Saved { note: NoteId },
    SaveFailed { note: NoteId, reason: String },
}

pub struct EditingSession<S, E> {
    store: SharedStore<S>,
    timing: SessionTiming,
    active: Option<NoteRef>,
    engine: Option<E>,
    pending_save: Option<JoinHandle<()>>,
    load_epoch: Arc<AtomicU64>,
    link: LinkFlow,
    events: broadcast::Sender<SessionEvent>,
}

impl<S, E> EditingSession<S, E>
where
    S: ContentStore + Send + 'static,
    E: RichTextEngine,
{
    pub fn new(store: SharedStore<S>, timing: SessionTiming) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            timing,
            active: None,
            engine: None,
            pending_save: None,
            load_epoch: Arc::new(AtomicU64::new(0)),
            link: LinkFlow::default(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &SharedStore<S> {
        &self.store
    }

    pub fn timing(&self) -> SessionTiming {
        self.timing
    }

    pub fn active(&self) -> Option<&NoteRef> {
        self.active.as_ref()
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    /// Engine access for non-content changes (caret, selection, focus).
    ///
    /// Use [`EditingSession::edit`] for anything that changes the document.
    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    pub fn load_epoch(&self) -> u64 {
        self.load_epoch.load(Ordering::SeqCst)
    }

    pub fn has_pending_save(&self) -> bool {
        self.pending_save
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn link_flow(&self) -> &LinkFlow {
        &self.link
    }

    /// Put `document` into the engine and make `note` the active note.
    ///
    /// Does not flush whatever was loaded before; see [`EditingSession::switch_to`].
    /// Any armed autosave is cancelled before anything else happens.
    pub async fn load(&mut self, note: NoteRef, document: Document) {
        self.cancel_pending_save();
        self.link.cancel();

        let document = document.normalized();
        self.engine
            .get_or_insert_with(E::default)
            .set_content(&document);
        let epoch = self.load_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("loaded {} (epoch {})", note.id, epoch);

        self.active = Some(note.clone());
        let _ = self.events.send(SessionEvent::Loaded { note });

        self.settle().await;
        if let Some(engine) = self.engine.as_mut() {
            engine.focus();
        }
    }

    /// Flush the active note, then read and load `note`.
    pub async fn switch_to(&mut self, note: NoteRef) -> Result<()> {
        self.flush_active()?;
        self.open(note).await
    }

    /// Create `title` as an empty note and make it active.
    pub async fn new_document(&mut self, title: &str) -> Result<NoteRef> {
        let title = title.trim();
        validate_title(title)?;
        self.flush_active()?;

        let note = with_store(&self.store, |store| {
            let note = store.reference_for(title);
            if store.exists(&note.id)? {
                return Err(JotterError::NameCollision(title.to_string()));
            }
            store.write(&note.id, &Document::empty())?;
            Ok(note)
        })?;

        self.load(note.clone(), Document::empty()).await;
        Ok(note)
    }

    async fn open(&mut self, note: NoteRef) -> Result<()> {
        let document = with_store(&self.store, |store| store.read(&note.id))?;
        self.load(note, document).await;
        Ok(())
    }

    /// Re-arm the autosave timer with the latest document state.
    pub fn on_user_edit(&mut self, current: Document) {
        let id = match &self.active {
            Some(note) => note.id.clone(),
            None => {
                log::debug!("edit with no active note ignored");
                return;
            }
        };
        self.cancel_pending_save();

        let store = Arc::clone(&self.store);
        let epoch = Arc::clone(&self.load_epoch);
        let armed_at = epoch.load(Ordering::SeqCst);
        let events = self.events.clone();
        let quiet_period = self.timing.quiet_period;

        self.pending_save = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            if epoch.load(Ordering::SeqCst) != armed_at {
                log::debug!("dropping stale autosave for {}", id);
                return;
            }

            let event = match with_store(&store, |store| store.write(&id, &current)) {
                Ok(()) => {
                    log::info!("autosaved {}", id);
                    SessionEvent::Saved { note: id }
                }
                Err(e) => {
                    log::warn!("autosave of {} failed: {}", id, e);
                    SessionEvent::SaveFailed {
                        note: id,
                        reason: e.to_string(),
                    }
                }
            };
            let _ = events.send(event);
        }));
    }

    /// Apply a content-changing mutation and schedule its autosave.
    ///
    /// Returns `None` when there is no live engine.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut E) -> R) -> Option<R> {
        let engine = self.engine.as_mut()?;
        let result = f(engine);
        let current = engine.content();
        self.on_user_edit(current);
        Some(result)
    }

    pub fn extract_current(&self) -> Option<Document> {
        self.engine.as_ref().map(RichTextEngine::content)
    }

    /// Persist the live document under the active id right now.
    ///
    /// Returns the id written, or `None` when nothing is active. On failure the
    /// engine keeps the document and any armed autosave stays armed.
    pub fn flush_active(&mut self) -> Result<Option<NoteId>> {
        let (Some(note), Some(engine)) = (&self.active, &self.engine) else {
            return Ok(None);
        };
        let id = note.id.clone();
        let document = engine.content();

        if let Err(e) = with_store(&self.store, |store| store.write(&id, &document)) {
            log::warn!("flush of {} failed: {}", id, e);
            return Err(e);
        }

        self.cancel_pending_save();
        log::info!("flushed {}", id);
        let _ = self.events.send(SessionEvent::Saved { note: id.clone() });
        Ok(Some(id))
    }

    /// Point the session at a renamed active note without reloading it.
    pub fn retarget(&mut self, note: NoteRef) {
        if self.active.is_none() {
            return;
        }
        let had_pending = self.has_pending_save();
        self.cancel_pending_save();
        log::debug!("active note is now {}", note.id);
        self.active = Some(note);

        if had_pending {
            if let Some(current) = self.extract_current() {
                self.on_user_edit(current);
            }
        }
    }

    /// Cancel the timer, drop the engine and forget the active note.
    ///
    /// Unsaved edits are not flushed. Safe to call repeatedly; a later `load`
    /// starts a fresh engine.
    pub fn dispose(&mut self) {
        self.cancel_pending_save();
        self.link.cancel();
        self.load_epoch.fetch_add(1, Ordering::SeqCst);
        if self.engine.take().is_some() {
            log::debug!("engine disposed");
        }
        self.active = None;
    }

    /// The active note was deleted: drop it without writing it back.
    pub fn close(&mut self) {
        if let Some(note) = &self.active {
            log::debug!("closing {}", note.id);
        }
        self.dispose();
    }

    /// Run the clipboard image pipeline for a paste into the live engine.
    pub async fn paste(&mut self, event: &mut PasteEvent) -> PasteOutcome {
        let Some(image) = clipboard::intercept(event) else {
            return PasteOutcome::NotHandled;
        };
        log::debug!("pasting {} ({} bytes)", image.mime, image.bytes.len());

        let src = match clipboard::encode_data_uri(image).await {
            Ok(src) => src,
            Err(e) => {
                log::warn!("pasted image dropped: {}", e);
                return PasteOutcome::Discarded;
            }
        };

        // Targets whatever engine and caret are current now, not at paste time.
        let inserted = self.edit(|engine| {
            engine.focus();
            engine.delete_selection();
            engine.insert_image(&src);
        });
        match inserted {
            Some(()) => PasteOutcome::Inserted,
            None => PasteOutcome::Discarded,
        }
    }

    /// Capture the selection and open the link flow. Only works while the
    /// engine has focus.
    pub fn capture_link(&mut self) -> Option<&LinkDraft> {
        let engine = self.engine.as_ref().filter(|engine| engine.has_focus())?;
        let range = engine.selection();
        let text = engine.text_in(range.clone());
        log::debug!("link flow opened over {:?}", range);
        self.link.capture(range, text);
        self.link.draft()
    }

    pub fn link_draft_mut(&mut self) -> Option<&mut LinkDraft> {
        self.link.draft_mut()
    }

    pub fn cancel_link(&mut self) {
        self.link.cancel();
    }

    /// Replace the captured range with the drafted link.
    pub async fn confirm_link(&mut self) -> LinkOutcome {
        if !self.link.is_open() {
            return LinkOutcome::NotOpen;
        }
        let Some(link) = self.link.confirm() else {
            return LinkOutcome::Inert;
        };

        self.settle().await;
        let applied = self.edit(|engine| {
            engine.focus();
            engine.select(link.range.clone());
            engine.delete_selection();
            engine.insert_link(&link.text, &link.href);
        });
        match applied {
            Some(()) => LinkOutcome::Applied,
            None => LinkOutcome::NotOpen,
        }
    }

    async fn settle(&self) {
        let settled = self
            .engine
            .as_ref()
            .map_or(true, RichTextEngine::is_settled);
        if !settled {
            tokio::time::sleep(self.timing.settle_delay).await;
        }
    }

    fn cancel_pending_save(&mut self) {
        if let Some(handle) = self.pending_save.take() {
            handle.abort();
        }
    }
}
