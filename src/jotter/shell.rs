//! Line-oriented editing host for `jotter edit`.
//!
//! Each plain line typed is inserted at the caret and goes through the
//! session's debounced autosave, exactly like keystrokes in a GUI editor.
//! Lines starting with `:` are host actions.

use crate::{print_messages, print_notes, AppContext};
use colored::*;
use jotter::api::{NotesApi, ShortcutOutcome};
use jotter::clipboard::{self, PasteOutcome};
use jotter::commands::{self, helpers::resolve_title, CmdMessage};
use jotter::engine::{MarkupEngine, RichTextEngine};
use jotter::error::{JotterError, Result};
use jotter::keymap::KeyChord;
use jotter::link::LinkOutcome;
use jotter::model::NoteRef;
use jotter::session::{SessionEvent, SessionTiming};
use jotter::store::fs::FileStore;
use jotter::store::{self, with_store, SharedStore};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::{self, error::RecvError};

const HELP: &str = "\
Type text to insert it at the caret. Commands:
  :notes                 list notes
  :open <title|number>   switch to a note
  :new                   create and open a new note
  :rename <title>        rename the open note
  :delete                delete the open note
  :show                  print the open note's markup
  :caret <n>             move the caret
  :select <from> <to>    select a range
  :link                  turn the selection into a link
  :key <chord>           press a shortcut, e.g. :key Ctrl+K
  :paste                 paste from the system clipboard
  :save                  write the open note now
  :quit                  save and leave (:quit! leaves without saving)";

pub fn run(ctx: AppContext, title: Option<String>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(JotterError::Io)?;
    let result = runtime.block_on(async move {
        let mut shell = Shell::new(ctx)?;
        shell.start(title).await?;
        shell.repl().await
    });
    // The stdin reader thread may still be parked on a read.
    runtime.shutdown_background();
    result
}

enum Input {
    Line(Option<String>),
    Event(std::result::Result<SessionEvent, RecvError>),
}

struct Shell {
    api: NotesApi<FileStore, MarkupEngine>,
    store: SharedStore<FileStore>,
    lines: Lines<BufReader<Stdin>>,
    events: broadcast::Receiver<SessionEvent>,
    events_open: bool,
}

impl Shell {
    fn new(ctx: AppContext) -> Result<Self> {
        let timing = SessionTiming::from(&ctx.config);
        ctx.config.keys.validate()?;

        let store = store::shared(ctx.store);
        let mut api = NotesApi::new(Arc::clone(&store), timing, ctx.config.keys.clone());
        api.refresh_notes()?;
        let events = api.session().subscribe();

        Ok(Self {
            api,
            store,
            lines: BufReader::new(tokio::io::stdin()).lines(),
            events,
            events_open: true,
        })
    }

    async fn start(&mut self, title: Option<String>) -> Result<()> {
        match title {
            Some(title) => match with_store(&self.store, |store| resolve_title(store, &title)) {
                Ok(note) => self.api.select_note(&note).await?,
                Err(e) if e.is_not_found() => {
                    self.api.session_mut().new_document(title.trim()).await?;
                    self.api.refresh_notes()?;
                }
                Err(e) => return Err(e),
            },
            None => match self.api.notes().first().cloned() {
                Some(note) => self.api.select_note(&note).await?,
                None => {
                    self.api.new_note().await?;
                }
            },
        }
        if let Some(note) = self.api.active() {
            println!("{} {}", "Editing".dimmed(), note.title.bold());
        }
        println!("{}", "Type :help for commands.".dimmed());
        Ok(())
    }

    async fn repl(&mut self) -> Result<()> {
        loop {
            self.print_prompt();
            let input = tokio::select! {
                line = self.lines.next_line() => Input::Line(line?),
                event = self.events.recv(), if self.events_open => Input::Event(event),
            };

            match input {
                Input::Line(None) => {
                    self.api.flush_active()?;
                    self.api.dispose();
                    return Ok(());
                }
                Input::Line(Some(line)) => match self.dispatch(&line).await {
                    Ok(true) => {}
                    Ok(false) => return Ok(()),
                    Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                },
                Input::Event(event) => self.report(event),
            }
        }
    }

    fn print_prompt(&self) {
        let title = self
            .api
            .active()
            .map(|note| note.title.as_str())
            .unwrap_or("no note");
        print!("{}> ", title.cyan());
        let _ = std::io::stdout().flush();
    }

    fn report(&mut self, event: std::result::Result<SessionEvent, RecvError>) {
        match event {
            Ok(SessionEvent::SaveFailed { note, reason }) => {
                eprintln!("\n{}", format!("Could not save {}: {}", note, reason).red());
            }
            Ok(SessionEvent::Saved { note }) => log::debug!("saved {}", note),
            Ok(SessionEvent::Loaded { .. }) => {}
            Err(RecvError::Lagged(skipped)) => log::debug!("missed {} session events", skipped),
            Err(RecvError::Closed) => self.events_open = false,
        }
    }

    /// Returns `false` when the shell should exit.
    async fn dispatch(&mut self, line: &str) -> Result<bool> {
        let Some(command) = line.strip_prefix(':') else {
            self.type_text(line);
            return Ok(true);
        };
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "help" | "h" => println!("{}", HELP),
            "notes" | "ls" => self.list_notes()?,
            "open" | "o" => self.open(arg).await?,
            "new" | "n" => {
                let note = self.api.new_note().await?;
                print_messages(&[CmdMessage::success(format!("Note created: {}", note.title))]);
            }
            "rename" => self.rename(arg)?,
            "delete" => self.delete_active().await?,
            "show" => match self.api.session().extract_current() {
                Some(document) => println!("{}", document),
                None => println!("{}", "No note open.".dimmed()),
            },
            "caret" => {
                let at = parse_offset(arg)?;
                self.with_engine(|engine| engine.select(at..at))?;
            }
            "select" => {
                let mut parts = arg.split_whitespace();
                let (from, to) = match (parts.next(), parts.next()) {
                    (Some(from), Some(to)) => (parse_offset(from)?, parse_offset(to)?),
                    _ => return Err(JotterError::InvalidInput("usage: :select <from> <to>".into())),
                };
                self.with_engine(|engine| engine.select(from..to))?;
                if let Some(engine) = self.api.session().engine() {
                    println!("{}", engine.text_in(engine.selection()).dimmed());
                }
            }
            "link" => {
                if self.api.session_mut().capture_link().is_some() {
                    self.link_prompt().await?;
                } else {
                    println!("{}", "No focused note to link in.".dimmed());
                }
            }
            "key" => self.press(arg).await?,
            "paste" => self.paste().await?,
            "save" | "w" => {
                if let Some(id) = self.api.session_mut().flush_active()? {
                    print_messages(&[CmdMessage::success(format!("Saved {}", id))]);
                }
            }
            "quit" | "q" => {
                self.api.flush_active()?;
                self.api.dispose();
                return Ok(false);
            }
            "quit!" | "q!" => {
                self.api.dispose();
                return Ok(false);
            }
            other => {
                return Err(JotterError::InvalidInput(format!(
                    "Unknown command :{} (try :help)",
                    other
                )))
            }
        }
        Ok(true)
    }

    fn type_text(&mut self, text: &str) {
        let typed = self.api.session_mut().edit(|engine| {
            engine.focus();
            engine.insert_text(text);
        });
        if typed.is_none() {
            println!("{}", "No note open; use :open or :new.".dimmed());
        }
    }

    fn with_engine(&mut self, f: impl FnOnce(&mut MarkupEngine)) -> Result<()> {
        let engine = self
            .api
            .session_mut()
            .engine_mut()
            .ok_or_else(|| JotterError::Api("No note open".into()))?;
        f(engine);
        Ok(())
    }

    fn list_notes(&mut self) -> Result<()> {
        let result = with_store(&self.store, |store| commands::list::run(store))?;
        print_notes(&result.listed_notes);
        self.api.refresh_notes()?;
        Ok(())
    }

    fn find_note(&self, query: &str) -> Result<NoteRef> {
        if let Ok(n) = query.parse::<usize>() {
            return self
                .api
                .notes()
                .get(n.wrapping_sub(1))
                .cloned()
                .ok_or_else(|| JotterError::Api(format!("No note number {}", n)));
        }
        with_store(&self.store, |store| resolve_title(store, query))
    }

    async fn open(&mut self, query: &str) -> Result<()> {
        if query.is_empty() {
            return Err(JotterError::InvalidInput("usage: :open <title|number>".into()));
        }
        let note = self.find_note(query)?;
        self.api.select_note(&note).await
    }

    fn rename(&mut self, new_title: &str) -> Result<()> {
        let note = self
            .api
            .active()
            .cloned()
            .ok_or_else(|| JotterError::Api("No note open".into()))?;
        let renamed = self.api.rename_note(&note, new_title)?;
        print_messages(&[CmdMessage::success(format!(
            "Note renamed: {} -> {}",
            note.title, renamed.title
        ))]);
        Ok(())
    }

    async fn delete_active(&mut self) -> Result<()> {
        match self.api.active().cloned() {
            Some(note) => self.confirm_delete(note).await,
            None => {
                println!("{}", "No note open.".dimmed());
                Ok(())
            }
        }
    }

    async fn confirm_delete(&mut self, note: NoteRef) -> Result<()> {
        let answer = self
            .ask(&format!("Delete \"{}\"? This cannot be undone. [y/N] ", note.title))
            .await?;
        if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            self.api.delete_note(&note)?;
            print_messages(&[CmdMessage::success(format!("Note deleted: {}", note.title))]);
        }
        Ok(())
    }

    async fn press(&mut self, chord: &str) -> Result<()> {
        let chord: KeyChord = chord.parse()?;
        match self.api.handle_shortcut(&chord).await? {
            ShortcutOutcome::Created(note) => {
                print_messages(&[CmdMessage::success(format!("Note created: {}", note.title))]);
            }
            ShortcutOutcome::LinkOpened => self.link_prompt().await?,
            ShortcutOutcome::LinkClosed => println!("{}", "Link cancelled.".dimmed()),
            ShortcutOutcome::ConfirmDelete(note) => self.confirm_delete(note).await?,
            ShortcutOutcome::Ignored => println!("{}", format!("{} does nothing here.", chord).dimmed()),
        }
        Ok(())
    }

    async fn link_prompt(&mut self) -> Result<()> {
        let captured = self
            .api
            .session()
            .link_flow()
            .draft()
            .map(|draft| draft.text.clone())
            .unwrap_or_default();

        let text = self.ask(&format!("Link text [{}]: ", captured)).await?;
        let url = self.ask("URL: ").await?;
        if let Some(draft) = self.api.session_mut().link_draft_mut() {
            if !text.trim().is_empty() {
                draft.text = text.trim().to_string();
            }
            draft.url = url;
        }

        match self.api.session_mut().confirm_link().await {
            LinkOutcome::Applied => println!("{}", "Link inserted.".green()),
            LinkOutcome::Inert => {
                self.api.session_mut().cancel_link();
                println!("{}", "No URL given; nothing inserted.".yellow());
            }
            LinkOutcome::NotOpen => {}
        }
        Ok(())
    }

    async fn paste(&mut self) -> Result<()> {
        let mut event = clipboard::read_system_clipboard()?;
        match self.api.session_mut().paste(&mut event).await {
            PasteOutcome::Inserted => println!("{}", paste_notice(PasteOutcome::Inserted).green()),
            PasteOutcome::Discarded => {
                println!("{}", paste_notice(PasteOutcome::Discarded).yellow())
            }
            PasteOutcome::NotHandled => {
                let text = event
                    .items
                    .iter()
                    .filter(|item| item.mime == "text/plain")
                    .find_map(|item| item.data.as_deref())
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned());
                match text {
                    Some(text) => self.type_text(&text),
                    None => println!("{}", "Clipboard is empty.".dimmed()),
                }
            }
        }
        Ok(())
    }

    async fn ask(&mut self, question: &str) -> Result<String> {
        print!("{}", question);
        let _ = std::io::stdout().flush();
        Ok(self.lines.next_line().await?.unwrap_or_default())
    }
}

/// A discarded image may have failed to encode or found no open note.
fn paste_notice(outcome: PasteOutcome) -> &'static str {
    match outcome {
        PasteOutcome::Inserted => "Image pasted.",
        PasteOutcome::Discarded => "Image not inserted.",
        PasteOutcome::NotHandled => "",
    }
}

fn parse_offset(value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| JotterError::InvalidInput(format!("Not an offset: '{}'", value)))
}
