use crate::error::{JotterError, Result};
use crate::keymap::{KeyChord, Keymap};
use crate::session::SessionTiming;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";
const HOME_ENV: &str = "JOTTER_HOME";
const DEFAULT_AUTOSAVE_MS: u64 = 500;
const DEFAULT_SETTLE_MS: u64 = 50;

/// Configuration for jotter, stored in `<config dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JotterConfig {
    /// Directory holding the `.html` notes. `None` until the user picks one.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Quiet period before an edit is autosaved
    #[serde(default = "default_autosave_ms")]
    pub autosave_ms: u64,

    /// Bounded wait for engines that cannot report when a change has settled
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default)]
    pub keys: Keymap,
}

fn default_autosave_ms() -> u64 {
    DEFAULT_AUTOSAVE_MS
}

fn default_settle_ms() -> u64 {
    DEFAULT_SETTLE_MS
}

impl Default for JotterConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            autosave_ms: DEFAULT_AUTOSAVE_MS,
            settle_ms: DEFAULT_SETTLE_MS,
            keys: Keymap::default(),
        }
    }
}

impl JotterConfig {
    pub const KEYS: &'static [&'static str] = &[
        "dir",
        "autosave-ms",
        "settle-ms",
        "key.new-note",
        "key.toggle-link",
        "key.delete-note",
    ];

    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(JotterError::Io)?;
        let config: JotterConfig =
            serde_json::from_str(&content).map_err(JotterError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(JotterError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(JotterError::Serialization)?;
        fs::write(config_path, content).map_err(JotterError::Io)?;
        Ok(())
    }

    /// Set the notes directory. Relative paths are resolved against `cwd`.
    pub fn set_data_dir(&mut self, dir: &Path, cwd: &Path) {
        self.data_dir = Some(if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            cwd.join(dir)
        });
    }

    pub fn set_autosave_ms(&mut self, value: &str) -> Result<()> {
        self.autosave_ms = parse_millis(value)?;
        Ok(())
    }

    pub fn set_settle_ms(&mut self, value: &str) -> Result<()> {
        self.settle_ms = parse_millis(value)?;
        Ok(())
    }

    /// Display value of a config key, `None` for unknown keys.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "dir" => Some(
                self.data_dir
                    .as_ref()
                    .map(|dir| dir.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string()),
            ),
            "autosave-ms" => Some(self.autosave_ms.to_string()),
            "settle-ms" => Some(self.settle_ms.to_string()),
            "key.new-note" => Some(self.keys.new_note.clone()),
            "key.toggle-link" => Some(self.keys.toggle_link.clone()),
            "key.delete-note" => Some(self.keys.delete_note.clone()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "dir" => {
                let cwd = std::env::current_dir().map_err(JotterError::Io)?;
                self.set_data_dir(Path::new(value), &cwd);
            }
            "autosave-ms" => self.set_autosave_ms(value)?,
            "settle-ms" => self.set_settle_ms(value)?,
            "key.new-note" | "key.toggle-link" | "key.delete-note" => {
                let chord: KeyChord = value.parse()?;
                let binding = chord.to_string();
                match key {
                    "key.new-note" => self.keys.new_note = binding,
                    "key.toggle-link" => self.keys.toggle_link = binding,
                    _ => self.keys.delete_note = binding,
                }
            }
            _ => {
                return Err(JotterError::InvalidInput(format!(
                    "Unknown config key: {}",
                    key
                )))
            }
        }
        Ok(())
    }

    /// Notes directory: explicit override, then config, then the default location.
    pub fn resolve_data_dir(&self, dir_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = dir_override {
            return Ok(dir.to_path_buf());
        }
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        if let Ok(home) = std::env::var(HOME_ENV) {
            return Ok(PathBuf::from(home).join("notes"));
        }
        ProjectDirs::from("com", "jotter", "jotter")
            .map(|dirs| dirs.data_dir().join("notes"))
            .ok_or(JotterError::NoDataDir)
    }
}

/// Where the config file lives: `$JOTTER_HOME`, else the platform config dir.
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var(HOME_ENV) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("com", "jotter", "jotter")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| JotterError::Api("Could not determine config dir".to_string()))
}

fn parse_millis(value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| JotterError::InvalidInput(format!("Expected milliseconds, got '{}'", value)))
}

impl From<&JotterConfig> for SessionTiming {
    fn from(config: &JotterConfig) -> Self {
        SessionTiming {
            quiet_period: Duration::from_millis(config.autosave_ms),
            settle_delay: Duration::from_millis(config.settle_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = JotterConfig::default();
        assert_eq!(config.data_dir, None);
        assert_eq!(config.autosave_ms, 500);
        assert_eq!(config.keys, Keymap::default());
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = JotterConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config, JotterConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_dir = temp_dir.path().join("nested");

        let mut config = JotterConfig::default();
        config.set_data_dir(Path::new("notes"), temp_dir.path());
        config.set_autosave_ms("250").unwrap();
        config.save(&config_dir).unwrap();

        let loaded = JotterConfig::load(&config_dir).unwrap();
        assert_eq!(loaded.data_dir, Some(temp_dir.path().join("notes")));
        assert_eq!(loaded.autosave_ms, 250);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILENAME), r#"{"settle_ms": 5}"#).unwrap();

        let config = JotterConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.settle_ms, 5);
        assert_eq!(config.autosave_ms, DEFAULT_AUTOSAVE_MS);
        assert_eq!(config.keys.toggle_link, "Ctrl+K");
    }

    #[test]
    fn test_override_wins_over_config() {
        let mut config = JotterConfig::default();
        config.data_dir = Some(PathBuf::from("/configured"));
        let dir = config.resolve_data_dir(Some(Path::new("/override"))).unwrap();
        assert_eq!(dir, PathBuf::from("/override"));
        assert_eq!(
            config.resolve_data_dir(None).unwrap(),
            PathBuf::from("/configured")
        );
    }

    #[test]
    fn test_bad_millis_rejected() {
        let mut config = JotterConfig::default();
        assert!(config.set_autosave_ms("soon").is_err());
    }

    #[test]
    fn test_get_and_set_keys() {
        let mut config = JotterConfig::default();
        assert_eq!(config.get("dir").unwrap(), "(not set)");
        config.set("settle-ms", "20").unwrap();
        config.set("key.toggle-link", "cmd+l").unwrap();
        assert_eq!(config.get("settle-ms").unwrap(), "20");
        assert_eq!(config.get("key.toggle-link").unwrap(), "Ctrl+L");
        assert!(config.set("key.new-note", "Hyper+N").is_err());
        assert!(config.set("colour", "red").is_err());
        assert!(config.get("colour").is_none());
    }

    #[test]
    fn test_timing_from_config() {
        let config = JotterConfig::default();
        let timing = SessionTiming::from(&config);
        assert_eq!(timing.quiet_period, Duration::from_millis(500));
        assert_eq!(timing.settle_delay, Duration::from_millis(50));
    }
}
