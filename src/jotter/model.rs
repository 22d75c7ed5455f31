use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable identifier of one persisted document.
///
/// The store decides what it looks like (a file name for `FileStore`, the
/// title for `InMemoryStore`). A rename always produces a new id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lightweight handle to a note: identity plus display title, no content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRef {
    pub id: NoteId,
    pub title: String,
}

impl NoteRef {
    pub fn new(id: impl Into<NoteId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

impl From<String> for NoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Serialized rich-text payload of one note.
///
/// The session never looks inside it; only list previews use [`Document::plain_text`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(String);

impl Document {
    /// Canonical markup of a document with no content.
    pub const EMPTY_MARKUP: &'static str = "<p></p>";

    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn empty() -> Self {
        Self(Self::EMPTY_MARKUP.to_string())
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Blank documents become the canonical empty document.
    pub fn normalized(self) -> Self {
        if self.is_blank() {
            Self::empty()
        } else {
            self
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text content with tags removed, entities decoded and whitespace collapsed.
    pub fn plain_text(&self) -> String {
        let mut raw = String::with_capacity(self.0.len());
        let mut in_tag = false;
        for c in self.0.chars() {
            match c {
                '<' => {
                    in_tag = true;
                    raw.push(' ');
                }
                '>' if in_tag => in_tag = false,
                _ if in_tag => {}
                _ => raw.push(c),
            }
        }

        let decoded = decode_entities(&raw);
        decoded.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Title given to the n-th new note.
pub fn default_title(n: usize) -> String {
    format!("New note {}", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_document_normalizes_to_canonical_empty() {
        assert_eq!(Document::new("").normalized(), Document::empty());
        assert_eq!(Document::new("  \n").normalized().as_str(), "<p></p>");
    }

    #[test]
    fn test_non_blank_document_is_kept() {
        let doc = Document::new("<p>hi</p>");
        assert_eq!(doc.clone().normalized(), doc);
    }

    #[test]
    fn test_plain_text_strips_markup() {
        let doc = Document::new("<p>Hello <strong>world</strong></p><p>a &amp; b</p>");
        assert_eq!(doc.plain_text(), "Hello world a & b");
    }

    #[test]
    fn test_plain_text_of_empty_document() {
        assert_eq!(Document::empty().plain_text(), "");
    }

    #[test]
    fn test_default_title() {
        assert_eq!(default_title(3), "New note 3");
    }
}
