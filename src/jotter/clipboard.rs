//! # Clipboard Image Pipeline
//!
//! A paste carrying image data is taken over by the session: the default paste
//! is suppressed, the image is encoded to a self-contained `data:` URI, and an
//! inline image node is inserted at the caret. Everything else (text, markup)
//! is left to the engine's normal paste path.
//!
//! The pipeline is split in two steps because only the first one is allowed to
//! touch the event:
//!
//! 1. [`intercept`] runs synchronously while the paste event is live. The first
//!    readable `image/*` item wins; the event is marked `default_prevented`.
//! 2. [`encode_data_uri`] runs afterwards, off the event, and may finish after
//!    the user has moved the caret or switched notes.
//!
//! Only one image is embedded per paste, however many image items the payload
//! carries.

use crate::error::{JotterError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::process::Command;

const IMAGE_PREFIX: &str = "image/";

/// One declared entry of a clipboard payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    pub mime: String,
    /// `None` when the payload could not be read.
    pub data: Option<Vec<u8>>,
}

impl ClipboardItem {
    pub fn new(mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            data: Some(data),
        }
    }

    pub fn unreadable(mime: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            data: None,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.to_ascii_lowercase().starts_with(IMAGE_PREFIX)
    }
}

/// A paste as delivered to the editor, items in declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteEvent {
    pub items: Vec<ClipboardItem>,
    pub default_prevented: bool,
}

impl PasteEvent {
    pub fn new(items: Vec<ClipboardItem>) -> Self {
        Self {
            items,
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

/// Image bytes taken out of a paste event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteOutcome {
    /// No image in the payload; the default paste proceeds.
    NotHandled,
    /// One image node was inserted.
    Inserted,
    /// The paste was taken over but there was no live engine to insert into.
    Discarded,
}

/// Claim the paste if it carries a readable image.
pub fn intercept(event: &mut PasteEvent) -> Option<ImagePayload> {
    let payload = event.items.iter().filter(|item| item.is_image()).find_map(|item| {
        match item.data.as_deref() {
            Some(bytes) if !bytes.is_empty() => Some(ImagePayload {
                mime: item.mime.to_ascii_lowercase(),
                bytes: bytes.to_vec(),
            }),
            _ => {
                log::warn!("skipping unreadable clipboard item ({})", item.mime);
                None
            }
        }
    })?;

    event.prevent_default();
    Some(payload)
}

/// Encode an image as a `data:<mime>;base64,...` URI.
pub async fn encode_data_uri(image: ImagePayload) -> Result<String> {
    let ImagePayload { mime, bytes } = image;
    let encoded = tokio::task::spawn_blocking(move || STANDARD.encode(bytes))
        .await
        .map_err(|e| JotterError::Decode(format!("image encoding did not finish: {}", e)))?;
    Ok(format!("data:{};base64,{}", mime, encoded))
}

/// Builds a paste event from the system clipboard in an OS-specific way.
/// - Linux: uses xclip, or wl-paste on Wayland
/// - macOS: uses pngpaste for images and pbpaste for text
pub fn read_system_clipboard() -> Result<PasteEvent> {
    #[cfg(target_os = "linux")]
    {
        read_linux()
    }

    #[cfg(target_os = "macos")]
    {
        read_macos()
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        Err(JotterError::Api(
            "Clipboard not supported on this platform".to_string(),
        ))
    }
}

fn run_capture(program: &str, args: &[&str]) -> Result<Vec<u8>> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| JotterError::Api(format!("Failed to run {}: {}", program, e)))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(JotterError::Api(format!("{} exited with error", program)))
    }
}

/// Only image and plain-text targets matter to the paste pipeline.
#[cfg(target_os = "linux")]
fn wanted_target(target: &str) -> Option<&'static str> {
    if target.starts_with(IMAGE_PREFIX) {
        Some("image")
    } else if target == "text/plain" || target == "UTF8_STRING" {
        Some("text/plain")
    } else {
        None
    }
}

#[cfg(target_os = "linux")]
fn read_linux() -> Result<PasteEvent> {
    // Try xclip first, then wl-paste
    if let Ok(targets) = run_capture("xclip", &["-selection", "clipboard", "-t", "TARGETS", "-o"]) {
        return Ok(collect_linux("xclip", &targets));
    }

    let targets = run_capture("wl-paste", &["--list-types"])
        .map_err(|e| JotterError::Api(format!("{}. Install xclip or wl-clipboard.", e)))?;
    Ok(collect_linux("wl-paste", &targets))
}

#[cfg(target_os = "linux")]
fn collect_linux(program: &str, targets: &[u8]) -> PasteEvent {
    let mut items = Vec::new();
    let mut seen_text = false;

    for target in String::from_utf8_lossy(targets).lines().map(str::trim) {
        let Some(kind) = wanted_target(target) else {
            continue;
        };
        if kind == "text/plain" {
            if seen_text {
                continue;
            }
            seen_text = true;
        }

        let data = if program == "xclip" {
            run_capture("xclip", &["-selection", "clipboard", "-t", target, "-o"])
        } else {
            run_capture("wl-paste", &["--no-newline", "--type", target])
        };
        let mime = if kind == "image" { target } else { kind };
        items.push(ClipboardItem {
            mime: mime.to_string(),
            data: data.ok(),
        });
    }

    PasteEvent::new(items)
}

#[cfg(target_os = "macos")]
fn read_macos() -> Result<PasteEvent> {
    let mut items = Vec::new();

    if let Ok(png) = run_capture("pngpaste", &["-"]) {
        items.push(ClipboardItem::new("image/png", png));
    }
    if let Ok(text) = run_capture("pbpaste", &[]) {
        if !text.is_empty() {
            items.push(ClipboardItem::new("text/plain", text));
        }
    }

    Ok(PasteEvent::new(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_paste_is_not_intercepted() {
        let mut event = PasteEvent::new(vec![ClipboardItem::new("text/plain", b"hi".to_vec())]);
        assert!(intercept(&mut event).is_none());
        assert!(!event.default_prevented);
    }

    #[test]
    fn test_first_image_item_wins() {
        let mut event = PasteEvent::new(vec![
            ClipboardItem::new("text/html", b"<b>x</b>".to_vec()),
            ClipboardItem::new("image/png", vec![1, 2, 3]),
            ClipboardItem::new("image/jpeg", vec![4, 5, 6]),
        ]);

        let image = intercept(&mut event).unwrap();
        assert_eq!(image.mime, "image/png");
        assert_eq!(image.bytes, vec![1, 2, 3]);
        assert!(event.default_prevented);
    }

    #[test]
    fn test_unreadable_image_is_skipped() {
        let mut event = PasteEvent::new(vec![
            ClipboardItem::unreadable("image/png"),
            ClipboardItem::new("image/gif", vec![7]),
        ]);
        assert_eq!(intercept(&mut event).unwrap().mime, "image/gif");
    }

    #[test]
    fn test_only_unreadable_image_falls_through() {
        let mut event = PasteEvent::new(vec![ClipboardItem::new("image/png", Vec::new())]);
        assert!(intercept(&mut event).is_none());
        assert!(!event.default_prevented);
    }

    #[test]
    fn test_mime_prefix_is_case_insensitive() {
        assert!(ClipboardItem::new("IMAGE/PNG", vec![1]).is_image());
        assert!(!ClipboardItem::new("text/plain", vec![1]).is_image());
    }

    #[tokio::test]
    async fn test_encode_data_uri() {
        let uri = encode_data_uri(ImagePayload {
            mime: "image/png".to_string(),
            bytes: b"hello".to_vec(),
        })
        .await
        .unwrap();
        assert_eq!(uri, "data:image/png;base64,aGVsbG8=");
    }
}
