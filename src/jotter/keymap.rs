use crate::error::{JotterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A key press with its modifiers, e.g. `Ctrl+Shift+D`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    /// Lowercased key name (`"k"`, `"backspace"`, ...).
    pub key: String,
}

impl KeyChord {
    pub fn ctrl(key: &str) -> Self {
        Self {
            ctrl: true,
            alt: false,
            shift: false,
            key: key.to_ascii_lowercase(),
        }
    }
}

impl FromStr for KeyChord {
    type Err = JotterError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chord = KeyChord {
            ctrl: false,
            alt: false,
            shift: false,
            key: String::new(),
        };

        let parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let (key, modifiers) = parts
            .split_last()
            .filter(|(key, _)| !key.is_empty())
            .ok_or_else(|| JotterError::InvalidInput(format!("Invalid key chord: {}", s)))?;

        for modifier in modifiers {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "cmd" | "meta" | "mod" => chord.ctrl = true,
                "alt" | "option" => chord.alt = true,
                "shift" => chord.shift = true,
                other => {
                    return Err(JotterError::InvalidInput(format!(
                        "Unknown modifier '{}' in {}",
                        other, s
                    )))
                }
            }
        }
        chord.key = key.to_ascii_lowercase();
        Ok(chord)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.alt {
            f.write_str("Alt+")?;
        }
        if self.shift {
            f.write_str("Shift+")?;
        }
        if self.key.chars().count() == 1 {
            write!(f, "{}", self.key.to_ascii_uppercase())
        } else {
            let mut chars = self.key.chars();
            match chars.next() {
                Some(first) => write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str()),
                None => Ok(()),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    NewNote,
    ToggleLink,
    DeleteNote,
}

/// Shortcut bindings, stored in the config as chord strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Keymap {
    #[serde(default = "default_new_note")]
    pub new_note: String,

    #[serde(default = "default_toggle_link")]
    pub toggle_link: String,

    #[serde(default = "default_delete_note")]
    pub delete_note: String,
}

fn default_new_note() -> String {
    "Ctrl+N".to_string()
}

fn default_toggle_link() -> String {
    "Ctrl+K".to_string()
}

fn default_delete_note() -> String {
    "Ctrl+Shift+D".to_string()
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            new_note: default_new_note(),
            toggle_link: default_toggle_link(),
            delete_note: default_delete_note(),
        }
    }
}

impl Keymap {
    /// Which shortcut, if any, a chord is bound to. Unparseable bindings never match.
    pub fn resolve(&self, chord: &KeyChord) -> Option<Shortcut> {
        [
            (&self.new_note, Shortcut::NewNote),
            (&self.toggle_link, Shortcut::ToggleLink),
            (&self.delete_note, Shortcut::DeleteNote),
        ]
        .into_iter()
        .find(|(binding, _)| binding.parse::<KeyChord>().is_ok_and(|bound| &bound == chord))
        .map(|(_, shortcut)| shortcut)
    }

    /// Fails on the first binding that does not parse.
    pub fn validate(&self) -> Result<()> {
        for binding in [&self.new_note, &self.toggle_link, &self.delete_note] {
            binding.parse::<KeyChord>()?;
        }
        Ok(())
    }
}
