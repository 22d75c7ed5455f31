//! # Link Insertion Protocol
//!
//! ```text
//! Idle ──capture──▶ AwaitingConfirmation ──confirm (URL set)──▶ Applied ─▶ Idle
//!                          │
//!                          └──cancel / dismiss──▶ Cancelled ─▶ Idle
//! ```
//!
//! Capturing stores the selection's offsets and text and opens a draft whose
//! display text is pre-filled with that text. Confirming with an empty or
//! all-whitespace URL does nothing; the flow stays open.
//!
//! The captured offsets are applied as-is when the link is inserted, even if
//! the document changed in between.

use std::ops::Range;

/// Selection captured when the link flow was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSelection {
    pub range_start: usize,
    pub range_end: usize,
    pub captured_text: String,
}

impl PendingSelection {
    pub fn range(&self) -> Range<usize> {
        self.range_start..self.range_end
    }
}

/// What the user is typing into the link-entry interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDraft {
    pub text: String,
    pub url: String,
}

impl LinkDraft {
    pub fn can_confirm(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Trimmed text shown for the link; falls back to the URL itself.
    pub fn display_text(&self) -> String {
        let text = self.text.trim();
        if text.is_empty() {
            self.url.trim().to_string()
        } else {
            text.to_string()
        }
    }
}

/// A confirmed link, ready to replace the captured range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInsertion {
    pub range: Range<usize>,
    pub text: String,
    pub href: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Applied,
    /// The URL is blank; nothing happened and the flow stays open.
    Inert,
    /// There was no open link flow to confirm.
    NotOpen,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LinkFlow {
    #[default]
    Idle,
    AwaitingConfirmation {
        pending: PendingSelection,
        draft: LinkDraft,
    },
}

impl LinkFlow {
    pub fn is_open(&self) -> bool {
        matches!(self, LinkFlow::AwaitingConfirmation { .. })
    }

    /// Open the flow for a captured selection. A previous capture is replaced.
    pub fn capture(&mut self, range: Range<usize>, captured_text: String) {
        let draft = LinkDraft {
            text: captured_text.clone(),
            url: String::new(),
        };
        *self = LinkFlow::AwaitingConfirmation {
            pending: PendingSelection {
                range_start: range.start,
                range_end: range.end,
                captured_text,
            },
            draft,
        };
    }

    pub fn pending(&self) -> Option<&PendingSelection> {
        match self {
            LinkFlow::AwaitingConfirmation { pending, .. } => Some(pending),
            LinkFlow::Idle => None,
        }
    }

    pub fn draft(&self) -> Option<&LinkDraft> {
        match self {
            LinkFlow::AwaitingConfirmation { draft, .. } => Some(draft),
            LinkFlow::Idle => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut LinkDraft> {
        match self {
            LinkFlow::AwaitingConfirmation { draft, .. } => Some(draft),
            LinkFlow::Idle => None,
        }
    }

    /// Consume the captured selection if the draft can be confirmed.
    ///
    /// Returns `None` and keeps the flow open when the URL is blank.
    pub fn confirm(&mut self) -> Option<LinkInsertion> {
        if !self.draft().is_some_and(LinkDraft::can_confirm) {
            return None;
        }
        match std::mem::take(self) {
            LinkFlow::AwaitingConfirmation { pending, draft } => Some(LinkInsertion {
                range: pending.range(),
                text: draft.display_text(),
                href: draft.url.trim().to_string(),
            }),
            LinkFlow::Idle => None,
        }
    }

    /// Dismiss without applying. The captured selection is dropped.
    pub fn cancel(&mut self) {
        *self = LinkFlow::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured_hello() -> LinkFlow {
        let mut flow = LinkFlow::default();
        flow.capture(3..8, "hello".to_string());
        flow
    }

    #[test]
    fn test_capture_prefills_text_and_leaves_url_empty() {
        let flow = captured_hello();
        let draft = flow.draft().unwrap();
        assert_eq!(draft.text, "hello");
        assert_eq!(draft.url, "");
        assert_eq!(flow.pending().unwrap().range(), 3..8);
    }

    #[test]
    fn test_empty_display_text_falls_back_to_url() {
        let mut flow = captured_hello();
        let draft = flow.draft_mut().unwrap();
        draft.text.clear();
        draft.url = "https://x.io".to_string();

        let link = flow.confirm().unwrap();
        assert_eq!(link.text, "https://x.io");
        assert_eq!(link.href, "https://x.io");
        assert_eq!(link.range, 3..8);
        assert!(!flow.is_open());
    }

    #[test]
    fn test_edited_display_text_is_used() {
        let mut flow = captured_hello();
        let draft = flow.draft_mut().unwrap();
        draft.text = "hi".to_string();
        draft.url = "https://x.io".to_string();
        assert_eq!(flow.confirm().unwrap().text, "hi");
    }

    #[test]
    fn test_whitespace_display_text_falls_back_to_url() {
        let mut flow = captured_hello();
        let draft = flow.draft_mut().unwrap();
        draft.text = "   ".to_string();
        draft.url = "https://x.io".to_string();
        assert_eq!(flow.confirm().unwrap().text, "https://x.io");
    }

    #[test]
    fn test_display_text_is_trimmed() {
        let mut flow = captured_hello();
        let draft = flow.draft_mut().unwrap();
        draft.text = "  hi ".to_string();
        draft.url = "https://x.io".to_string();
        assert_eq!(flow.confirm().unwrap().text, "hi");
    }

    #[test]
    fn test_blank_url_is_inert() {
        let mut flow = captured_hello();
        flow.draft_mut().unwrap().url = "   ".to_string();
        assert!(flow.confirm().is_none());
        assert!(flow.is_open());
    }

    #[test]
    fn test_url_is_trimmed() {
        let mut flow = captured_hello();
        flow.draft_mut().unwrap().url = "  https://x.io ".to_string();
        assert_eq!(flow.confirm().unwrap().href, "https://x.io");
    }

    #[test]
    fn test_cancel_discards_selection() {
        let mut flow = captured_hello();
        flow.cancel();
        assert!(flow.pending().is_none());
        assert!(flow.confirm().is_none());
    }
}
