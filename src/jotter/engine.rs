//! # Rich-Text Engine
//!
//! The editing session owns exactly one engine instance at a time and talks to
//! it only through [`RichTextEngine`]. Offsets are character positions in the
//! engine's document, and selections are half-open ranges.
//!
//! [`MarkupEngine`] is the bundled engine: the document is its markup string,
//! edited in place. Offsets index that string, but an offset can never rest
//! inside a tag or an entity: the start of a selection moves past the token,
//! the end moves before it. Deleting a range keeps any tag whose partner lies
//! outside the range, so edits never leave unbalanced markup behind.
//! [`RichTextEngine::text_in`] returns the visible text only.
//!
//! A GUI host can provide its own engine by implementing the trait over a real
//! WYSIWYG surface.

use crate::model::Document;
use std::ops::Range;

pub trait RichTextEngine: Default {
    /// Replace the whole document.
    fn set_content(&mut self, document: &Document);

    /// Current state serialized as a document.
    fn content(&self) -> Document;

    fn focus(&mut self);

    fn blur(&mut self);

    fn has_focus(&self) -> bool;

    /// Current selection; empty when only a caret is placed.
    fn selection(&self) -> Range<usize>;

    /// Select a range. Out-of-bounds offsets are clamped.
    fn select(&mut self, range: Range<usize>);

    /// Plain text of a range, without markup.
    fn text_in(&self, range: Range<usize>) -> String;

    /// Document length in offset units.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn delete_selection(&mut self);

    /// Insert typed text at the caret, replacing the selection.
    fn insert_text(&mut self, text: &str);

    /// Insert an inline image node at the caret, replacing the selection.
    fn insert_image(&mut self, src: &str);

    /// Insert a hyperlink node at the caret, replacing the selection.
    fn insert_link(&mut self, text: &str, href: &str);

    /// Whether the last content change has been fully applied.
    ///
    /// Engines that apply edits synchronously return `true`; the session then
    /// focuses immediately instead of waiting out its settle delay.
    fn is_settled(&self) -> bool {
        false
    }
}

/// Engine over a markup string with a character-offset selection.
#[derive(Debug, Clone, Default)]
pub struct MarkupEngine {
    markup: String,
    selection: Range<usize>,
    focused: bool,
}

impl MarkupEngine {
    pub fn markup(&self) -> &str {
        &self.markup
    }

    fn char_len(&self) -> usize {
        self.markup.chars().count()
    }

    fn byte_index(&self, offset: usize) -> usize {
        self.markup
            .char_indices()
            .nth(offset)
            .map(|(i, _)| i)
            .unwrap_or(self.markup.len())
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let len = self.char_len();
        let (a, b) = (range.start.min(len), range.end.min(len));
        if a <= b {
            a..b
        } else {
            b..a
        }
    }

    /// Clamp, then move both ends out of any tag or entity they fall inside.
    fn snap(&self, tokens: &[Token], range: Range<usize>) -> Range<usize> {
        let range = self.clamp(range);
        let start = token_around(tokens, range.start).map_or(range.start, |t| t.span.end);
        let end = token_around(tokens, range.end).map_or(range.end, |t| t.span.start);
        if end < start {
            start..start
        } else {
            start..end
        }
    }

    /// Replace the selection with raw markup and put the caret after it.
    fn replace_selection(&mut self, markup: &str) {
        self.delete_selection();
        let at = self.selection.start;
        let byte = self.byte_index(at);
        self.markup.insert_str(byte, markup);
        let caret = at + markup.chars().count();
        self.selection = caret..caret;
    }

    /// Caret position after loading: end of the last paragraph, or the end.
    fn initial_caret(&self) -> usize {
        let len = self.char_len();
        if self.markup.ends_with("</p>") {
            len - "</p>".len()
        } else {
            len
        }
    }
}

impl RichTextEngine for MarkupEngine {
    fn set_content(&mut self, document: &Document) {
        self.markup = document.as_str().to_string();
        let caret = self.initial_caret();
        self.selection = caret..caret;
    }

    fn content(&self) -> Document {
        Document::new(self.markup.clone())
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn blur(&mut self) {
        self.focused = false;
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    fn select(&mut self, range: Range<usize>) {
        let chars: Vec<char> = self.markup.chars().collect();
        self.selection = self.snap(&tokenize(&chars), range);
    }

    fn text_in(&self, range: Range<usize>) -> String {
        let chars: Vec<char> = self.markup.chars().collect();
        let tokens = tokenize(&chars);
        let range = self.snap(&tokens, range);
        let mut text = String::new();
        for token in tokens
            .iter()
            .filter(|t| t.span.start >= range.start && t.span.end <= range.end)
        {
            let raw = &chars[token.span.clone()];
            match token.kind {
                TokenKind::Char => text.extend(raw),
                TokenKind::Entity => {
                    let entity: String = raw.iter().collect();
                    match decode_entity(&entity) {
                        Some(c) => text.push(c),
                        None => text.push_str(&entity),
                    }
                }
                TokenKind::Open | TokenKind::Close | TokenKind::Void => {}
            }
        }
        text
    }

    fn len(&self) -> usize {
        self.char_len()
    }

    fn delete_selection(&mut self) {
        let chars: Vec<char> = self.markup.chars().collect();
        let tokens = tokenize(&chars);
        let range = self.snap(&tokens, self.selection.clone());
        if !range.is_empty() {
            let kept = unbalanced_tags(&chars, &tokens, range.clone());
            let (start, end) = (self.byte_index(range.start), self.byte_index(range.end));
            self.markup.replace_range(start..end, &kept);
        }
        self.selection = range.start..range.start;
    }

    fn insert_text(&mut self, text: &str) {
        self.replace_selection(&escape_text(text));
    }

    fn insert_image(&mut self, src: &str) {
        self.replace_selection(&format!("<img src=\"{}\">", escape_attr(src)));
    }

    fn insert_link(&mut self, text: &str, href: &str) {
        self.replace_selection(&format!(
            "<a href=\"{}\">{}</a>",
            escape_attr(href),
            escape_text(text)
        ));
    }

    fn is_settled(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Char,
    Entity,
    Open,
    Close,
    Void,
}

#[derive(Debug, Clone)]
struct Token {
    span: Range<usize>,
    kind: TokenKind,
    /// Lowercased tag name; empty for text.
    name: String,
}

const VOID_TAGS: &[&str] = &["img", "br", "hr", "input", "wbr"];
const MAX_ENTITY_LEN: usize = 12;

/// Split markup into tags, entities and single characters, by char offset.
fn tokenize(chars: &[char]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let token = match chars[i] {
            '<' => chars[i..]
                .iter()
                .position(|&c| c == '>')
                .map(|len| tag_token(chars, i..i + len + 1)),
            '&' => chars[i..]
                .iter()
                .take(MAX_ENTITY_LEN)
                .position(|&c| c == ';')
                .filter(|&len| {
                    len > 1
                        && chars[i + 1..i + len]
                            .iter()
                            .all(|c| c.is_ascii_alphanumeric() || *c == '#')
                })
                .map(|len| Token {
                    span: i..i + len + 1,
                    kind: TokenKind::Entity,
                    name: String::new(),
                }),
            _ => None,
        };
        let token = token.unwrap_or(Token {
            span: i..i + 1,
            kind: TokenKind::Char,
            name: String::new(),
        });
        i = token.span.end;
        tokens.push(token);
    }
    tokens
}

fn tag_token(chars: &[char], span: Range<usize>) -> Token {
    let inner: String = chars[span.start + 1..span.end - 1].iter().collect();
    let name = inner
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let kind = if inner.starts_with('/') {
        TokenKind::Close
    } else if inner.starts_with('!')
        || inner.starts_with('?')
        || inner.ends_with('/')
        || VOID_TAGS.contains(&name.as_str())
    {
        TokenKind::Void
    } else {
        TokenKind::Open
    };
    Token { span, kind, name }
}

fn token_around(tokens: &[Token], offset: usize) -> Option<&Token> {
    tokens
        .iter()
        .find(|t| t.span.start < offset && offset < t.span.end)
}

/// Tags inside `range` whose partner lies outside it, in document order.
fn unbalanced_tags(chars: &[char], tokens: &[Token], range: Range<usize>) -> String {
    let inside: Vec<&Token> = tokens
        .iter()
        .filter(|t| t.span.start >= range.start && t.span.end <= range.end)
        .collect();
    let mut keep = vec![false; inside.len()];
    let mut open: Vec<usize> = Vec::new();
    for (i, token) in inside.iter().enumerate() {
        match token.kind {
            TokenKind::Open => {
                keep[i] = true;
                open.push(i);
            }
            TokenKind::Close => match open.iter().rposition(|&j| inside[j].name == token.name) {
                Some(pos) => {
                    keep[open[pos]] = false;
                    open.truncate(pos);
                }
                None => keep[i] = true,
            },
            TokenKind::Char | TokenKind::Entity | TokenKind::Void => {}
        }
    }
    inside
        .iter()
        .zip(keep)
        .filter(|(_, keep)| *keep)
        .flat_map(|(token, _)| chars[token.span.clone()].iter())
        .collect()
}

fn decode_entity(entity: &str) -> Option<char> {
    let body = entity.strip_prefix('&')?.strip_suffix(';')?;
    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = body.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(markup: &str) -> MarkupEngine {
        let mut engine = MarkupEngine::default();
        engine.set_content(&Document::new(markup));
        engine
    }

    #[test]
    fn test_set_content_places_caret_in_last_paragraph() {
        let engine = engine_with("<p>hello</p>");
        assert_eq!(engine.selection(), 8..8);
    }

    #[test]
    fn test_insert_text_is_escaped() {
        let mut engine = engine_with("<p></p>");
        engine.insert_text("a < b");
        assert_eq!(engine.markup(), "<p>a &lt; b</p>");
    }

    #[test]
    fn test_text_in_and_select_clamp() {
        let mut engine = engine_with("<p>hello</p>");
        assert_eq!(engine.text_in(3..8), "hello");
        engine.select(40..3);
        assert_eq!(engine.selection(), 3..12);
    }

    #[test]
    fn test_delete_selection_leaves_caret_at_start() {
        let mut engine = engine_with("<p>hello</p>");
        engine.select(3..8);
        engine.delete_selection();
        assert_eq!(engine.markup(), "<p></p>");
        assert_eq!(engine.selection(), 3..3);
    }

    #[test]
    fn test_insert_link_replaces_selection() {
        let mut engine = engine_with("<p>hello</p>");
        engine.select(3..8);
        engine.insert_link("hi", "https://x.io?a=1&b=\"2\"");
        assert_eq!(
            engine.markup(),
            "<p><a href=\"https://x.io?a=1&amp;b=&quot;2&quot;\">hi</a></p>"
        );
    }

    #[test]
    fn test_insert_image_at_caret() {
        let mut engine = engine_with("<p>ab</p>");
        engine.select(4..4);
        engine.insert_image("data:image/png;base64,AAAA");
        assert_eq!(
            engine.markup(),
            "<p>a<img src=\"data:image/png;base64,AAAA\">b</p>"
        );
    }

    #[test]
    fn test_offsets_are_characters_not_bytes() {
        let mut engine = engine_with("<p>héllo</p>");
        engine.select(3..8);
        assert_eq!(engine.text_in(3..8), "héllo");
        engine.insert_text("x");
        assert_eq!(engine.markup(), "<p>x</p>");
    }

    #[test]
    fn test_text_in_skips_formatting_tags() {
        let engine = engine_with("<p><b>hello</b></p>");
        assert_eq!(engine.text_in(3..15), "hello");
    }

    #[test]
    fn test_text_in_decodes_entities() {
        let engine = engine_with("<p>a &amp; b&#33;</p>");
        assert_eq!(engine.text_in(3..17), "a & b!");
    }

    #[test]
    fn test_link_over_formatted_selection() {
        let mut engine = engine_with("<p><b>hello</b></p>");
        engine.select(3..15);
        let text = engine.text_in(engine.selection());
        engine.insert_link(&text, "https://x.io");
        assert_eq!(
            engine.markup(),
            "<p><a href=\"https://x.io\">hello</a></p>"
        );
    }

    #[test]
    fn test_caret_inside_tag_moves_past_it() {
        let mut engine = engine_with("<p>ab</p>");
        engine.select(1..1);
        assert_eq!(engine.selection(), 3..3);
        engine.insert_image("data:image/png;base64,AA");
        assert_eq!(
            engine.markup(),
            "<p><img src=\"data:image/png;base64,AA\">ab</p>"
        );
    }

    #[test]
    fn test_caret_inside_entity_moves_past_it() {
        let mut engine = engine_with("<p>a&amp;b</p>");
        engine.select(6..6);
        assert_eq!(engine.selection(), 9..9);
    }

    #[test]
    fn test_selection_ending_inside_tag_stops_before_it() {
        let mut engine = engine_with("<p>hello</p>");
        engine.select(3..10);
        assert_eq!(engine.selection(), 3..8);
    }

    #[test]
    fn test_delete_keeps_tags_closed_outside_the_range() {
        let mut engine = engine_with("<p><b>hello</b> world</p>");
        engine.select(6..17);
        engine.delete_selection();
        assert_eq!(engine.markup(), "<p><b></b>orld</p>");
        assert_eq!(engine.selection(), 6..6);
    }

    #[test]
    fn test_delete_across_paragraphs_keeps_both() {
        let mut engine = engine_with("<p>ab</p><p>cd</p>");
        engine.select(4..13);
        engine.delete_selection();
        assert_eq!(engine.markup(), "<p>a</p><p>d</p>");
    }
}
