use crate::model::NoteId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JotterError {
    #[error("Note not found: {0}")]
    NotFound(NoteId),

    #[error("A note named '{0}' already exists")]
    NameCollision(String),

    #[error("Failed to save {id}: {reason}")]
    WriteFailure { id: NoteId, reason: String },

    #[error("Clipboard decode error: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No notes directory configured (use `jotter config dir <path>` or --dir)")]
    NoDataDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Api Error: {0}")]
    Api(String),
}

impl JotterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, JotterError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, JotterError>;
