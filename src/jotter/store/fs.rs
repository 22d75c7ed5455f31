use super::{validate_title, ContentStore};
use crate::error::{JotterError, Result};
use crate::model::{Document, NoteId, NoteRef};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

const NOTE_EXT: &str = ".html";

/// Notes as `<title>.html` files in a single directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `id`. The file may not exist yet.
    pub fn note_path(&self, id: &NoteId) -> Result<PathBuf> {
        let name = id.as_str();
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0')
            || name == "."
            || name == ".."
        {
            return Err(JotterError::InvalidInput(format!("Invalid note id: {}", id)));
        }
        Ok(self.root.join(name))
    }

    fn existing_path(&self, id: &NoteId) -> Result<PathBuf> {
        let path = self.note_path(id)?;
        if !path.is_file() {
            return Err(JotterError::NotFound(id.clone()));
        }
        Ok(path)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(JotterError::Io)?;
        }
        Ok(())
    }

    fn title_of(file_name: &str) -> Option<&str> {
        file_name
            .strip_suffix(NOTE_EXT)
            .filter(|title| !title.is_empty() && !title.starts_with('.'))
    }
}

impl ContentStore for FileStore {
    fn list(&self) -> Result<Vec<NoteRef>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut notes = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(JotterError::Io)? {
            let entry = entry.map_err(JotterError::Io)?;
            if !entry.file_type().map_err(JotterError::Io)?.is_file() {
                continue;
            }
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if let Some(title) = Self::title_of(&file_name) {
                notes.push(NoteRef::new(file_name.as_str(), title));
            }
        }

        notes.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(notes)
    }

    fn read(&self, id: &NoteId) -> Result<Document> {
        let path = self.existing_path(id)?;
        let content = fs::read_to_string(path).map_err(JotterError::Io)?;
        Ok(Document::new(content))
    }

    fn write(&mut self, id: &NoteId, document: &Document) -> Result<()> {
        let target = self.note_path(id)?;
        self.ensure_dir()?;

        // Atomic write
        let tmp_path = self.root.join(format!(".{}.tmp", id));
        fs::write(&tmp_path, document.as_str()).map_err(|e| JotterError::WriteFailure {
            id: id.clone(),
            reason: e.to_string(),
        })?;
        fs::rename(&tmp_path, &target).map_err(|e| JotterError::WriteFailure {
            id: id.clone(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    fn rename(&mut self, id: &NoteId, new_title: &str) -> Result<NoteId> {
        validate_title(new_title)?;
        let source = self.existing_path(id)?;

        let new_id = self.reference_for(new_title).id;
        if &new_id == id {
            return Ok(new_id);
        }

        let target = self.note_path(&new_id)?;
        if target.exists() {
            return Err(JotterError::NameCollision(new_title.to_string()));
        }

        fs::rename(source, target).map_err(JotterError::Io)?;
        Ok(new_id)
    }

    fn delete(&mut self, id: &NoteId) -> Result<()> {
        let path = self.existing_path(id)?;
        fs::remove_file(path).map_err(JotterError::Io)?;
        Ok(())
    }

    fn reference_for(&self, title: &str) -> NoteRef {
        NoteRef::new(format!("{}{}", title, NOTE_EXT), title)
    }

    fn exists(&self, id: &NoteId) -> Result<bool> {
        Ok(self.note_path(id)?.is_file())
    }

    fn modified(&self, id: &NoteId) -> Result<Option<DateTime<Utc>>> {
        let path = self.existing_path(id)?;
        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(JotterError::Io)?;
        Ok(Some(DateTime::<Utc>::from(modified)))
    }
}
