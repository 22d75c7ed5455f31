//! Store-level operations used by the CLI.
//!
//! Each submodule exposes a `run` function taking the store (and nothing from
//! the editing session) and returning a [`CmdResult`]. Output formatting is
//! the caller's job.

use crate::config::JotterConfig;
use crate::model::{Document, NoteRef};
use chrono::{DateTime, Utc};

pub mod config;
pub mod create;
pub mod delete;
pub mod helpers;
pub mod list;
pub mod rename;
pub mod view;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// One row of a note listing.
#[derive(Debug, Clone)]
pub struct NoteListing {
    pub note: NoteRef,
    pub preview: String,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_notes: Vec<NoteRef>,
    pub listed_notes: Vec<NoteListing>,
    pub documents: Vec<(NoteRef, Document)>,
    pub config: Option<JotterConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_notes(mut self, notes: Vec<NoteRef>) -> Self {
        self.affected_notes = notes;
        self
    }

    pub fn with_listed_notes(mut self, notes: Vec<NoteListing>) -> Self {
        self.listed_notes = notes;
        self
    }

    pub fn with_documents(mut self, documents: Vec<(NoteRef, Document)>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_config(mut self, config: JotterConfig) -> Self {
        self.config = Some(config);
        self
    }
}
