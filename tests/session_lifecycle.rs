use jotter::api::NotesApi;
use jotter::engine::{MarkupEngine, RichTextEngine};
use jotter::keymap::Keymap;
use jotter::model::{Document, NoteRef};
use jotter::session::{EditingSession, SessionEvent, SessionTiming};
use jotter::store::fs::FileStore;
use jotter::store::{shared, ContentStore};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

fn file_store(dir: &TempDir) -> FileStore {
    FileStore::new(dir.path().to_path_buf())
}

fn seed(dir: &TempDir, title: &str, markup: &str) -> NoteRef {
    let mut store = file_store(dir);
    let note = store.reference_for(title);
    store.write(&note.id, &Document::new(markup)).unwrap();
    note
}

fn on_disk(dir: &TempDir, title: &str) -> String {
    fs::read_to_string(dir.path().join(format!("{}.html", title))).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_switching_notes_persists_each_under_its_own_file() {
    let dir = TempDir::new().unwrap();
    let a = seed(&dir, "A", "<p>alpha</p>");
    let b = seed(&dir, "B", "<p>beta</p>");
    let store = shared(file_store(&dir));
    let mut session: EditingSession<_, MarkupEngine> =
        EditingSession::new(Arc::clone(&store), SessionTiming::default());

    session.switch_to(a.clone()).await.unwrap();
    session.edit(|engine| engine.insert_text(" one"));
    session.switch_to(b.clone()).await.unwrap();
    session.edit(|engine| engine.insert_text(" two"));
    session.switch_to(a).await.unwrap();
    sleep(Duration::from_secs(3)).await;

    assert_eq!(on_disk(&dir, "A"), "<p>alpha one</p>");
    assert_eq!(on_disk(&dir, "B"), "<p>beta two</p>");
    assert_eq!(
        session.extract_current(),
        Some(Document::new("<p>alpha one</p>"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_autosave_reaches_disk_after_quiet_period() {
    let dir = TempDir::new().unwrap();
    let a = seed(&dir, "A", "<p></p>");
    let timing = SessionTiming {
        quiet_period: Duration::from_millis(200),
        settle_delay: Duration::from_millis(10),
    };
    let mut session: EditingSession<_, MarkupEngine> =
        EditingSession::new(shared(file_store(&dir)), timing);
    let mut events = session.subscribe();

    session.switch_to(a.clone()).await.unwrap();
    session.edit(|engine| engine.insert_text("draft"));
    sleep(Duration::from_millis(100)).await;
    assert_eq!(on_disk(&dir, "A"), "<p></p>");

    sleep(Duration::from_millis(150)).await;
    assert_eq!(on_disk(&dir, "A"), "<p>draft</p>");

    let mut saw_save = false;
    while let Ok(event) = events.try_recv() {
        if event == (SessionEvent::Saved { note: a.id.clone() }) {
            saw_save = true;
        }
    }
    assert!(saw_save);
}

#[tokio::test(start_paused = true)]
async fn test_host_rename_and_delete_on_disk() {
    let dir = TempDir::new().unwrap();
    let a = seed(&dir, "A", "<p>a</p>");
    seed(&dir, "B", "<p>b</p>");
    let store = shared(file_store(&dir));
    let mut api: NotesApi<_, MarkupEngine> =
        NotesApi::new(store, SessionTiming::default(), Keymap::default());
    api.refresh_notes().unwrap();

    api.select_note(&a).await.unwrap();
    api.session_mut().edit(|engine| engine.insert_text("!"));
    let renamed = api.rename_note(&a, "Alpha").unwrap();

    assert_eq!(renamed.id.as_str(), "Alpha.html");
    assert_eq!(on_disk(&dir, "Alpha"), "<p>a!</p>");
    assert!(!dir.path().join("A.html").exists());

    api.delete_note(&renamed).unwrap();
    sleep(Duration::from_secs(3)).await;

    assert!(!dir.path().join("Alpha.html").exists());
    let titles: Vec<_> = api.notes().iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["B"]);
    assert!(api.active().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_new_note_file_holds_canonical_empty_document() {
    let dir = TempDir::new().unwrap();
    let mut api: NotesApi<_, MarkupEngine> = NotesApi::new(
        shared(file_store(&dir)),
        SessionTiming::default(),
        Keymap::default(),
    );

    let note = api.new_note().await.unwrap();

    assert_eq!(note.title, "New note 1");
    assert_eq!(on_disk(&dir, "New note 1"), "<p></p>");
    assert!(api.session().engine().unwrap().has_focus());
}
