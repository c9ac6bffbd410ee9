//! Persisted display preferences: relative-day countdowns and the theme.
//!
//! Preferences are read once at boot and written back on every change.
//! Persistence is best-effort: a failed write is logged and the in-memory
//! value still takes effect for the session.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// Storage key of the relative-days flag (`"0"` / `"1"`).
pub const SHOW_DAYS_KEY: &str = "syll_show_days";
/// Storage key of the theme (`"light"` / `"dark"`).
pub const THEME_KEY: &str = "syll_theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Value of the document's `data-theme` attribute; light removes it.
    pub fn data_attribute(self) -> Option<&'static str> {
        match self {
            Theme::Light => None,
            Theme::Dark => Some("dark"),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme '{0}' (expected light or dark)")]
pub struct ParseThemeError(pub String);

impl FromStr for Theme {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(ParseThemeError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub show_relative_days: bool,
    pub theme: Theme,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("preference storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("preference file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
    #[error("preference storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable string key/value storage for preferences.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store, optionally rejecting every write.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
    reject_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    /// A store whose writes always fail, like a browser with storage disabled.
    pub fn rejecting_writes() -> Self {
        Self {
            reject_writes: true,
            ..Self::default()
        }
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.reject_writes {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences kept as a flat JSON object in a file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/syllabus-dashboard/preferences.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("syllabus-dashboard")
            .join("preferences.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // Corrupt files are overwritten
        let mut values = self.read_all().unwrap_or_else(|e| {
            tracing::warn!("Discarding unreadable preference file {:?}: {}", self.path, e);
            BTreeMap::new()
        });
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        Ok(())
    }
}

/// Preferences plus the store they persist to.
pub struct SettingsStore {
    prefs: Preferences,
    store: Box<dyn PreferenceStore>,
}

impl fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsStore")
            .field("prefs", &self.prefs)
            .finish_non_exhaustive()
    }
}

impl SettingsStore {
    /// Restore preferences; anything missing or unreadable falls back to
    /// relative days off and the light theme.
    pub fn load(store: Box<dyn PreferenceStore>) -> Self {
        let show_relative_days = match store.get(SHOW_DAYS_KEY) {
            Ok(value) => value.as_deref() == Some("1"),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", SHOW_DAYS_KEY, e);
                false
            }
        };

        let theme = match store.get(THEME_KEY) {
            Ok(Some(value)) => value.parse::<Theme>().unwrap_or_else(|e| {
                tracing::debug!("Ignoring stored theme: {}", e);
                Theme::Light
            }),
            Ok(None) => Theme::Light,
            Err(e) => {
                tracing::warn!("Could not read {}: {}", THEME_KEY, e);
                Theme::Light
            }
        };

        let prefs = Preferences {
            show_relative_days,
            theme,
        };
        tracing::debug!(?prefs, "Restored preferences");
        Self { prefs, store }
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs
    }

    /// Returns whether the value changed.
    pub fn set_show_relative_days(&mut self, on: bool) -> bool {
        let changed = self.prefs.show_relative_days != on;
        self.prefs.show_relative_days = on;
        self.persist(SHOW_DAYS_KEY, if on { "1" } else { "0" });
        changed
    }

    /// Returns whether the value changed.
    pub fn set_theme(&mut self, theme: Theme) -> bool {
        let changed = self.prefs.theme != theme;
        self.prefs.theme = theme;
        self.persist(THEME_KEY, theme.as_str());
        changed
    }

    fn persist(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!("Failed to persist {}={}: {}", key, value, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Theme Tests ====================

    #[test]
    fn test_theme_parse_and_attribute() {
        assert_eq!("dark".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!(" Light ".parse::<Theme>(), Ok(Theme::Light));
        assert!("solarized".parse::<Theme>().is_err());
        assert_eq!(Theme::Dark.data_attribute(), Some("dark"));
        assert_eq!(Theme::Light.data_attribute(), None);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }

    // ==================== Load Tests ====================

    #[test]
    fn test_load_defaults_from_empty_store() {
        let settings = SettingsStore::load(Box::new(MemoryStore::new()));
        assert_eq!(settings.preferences(), Preferences::default());
        assert!(!settings.preferences().show_relative_days);
        assert_eq!(settings.preferences().theme, Theme::Light);
    }

    #[test]
    fn test_load_restores_values() {
        let store = MemoryStore::new()
            .with_value(SHOW_DAYS_KEY, "1")
            .with_value(THEME_KEY, "dark");
        let settings = SettingsStore::load(Box::new(store));

        assert!(settings.preferences().show_relative_days);
        assert_eq!(settings.preferences().theme, Theme::Dark);
    }

    #[test]
    fn test_load_ignores_garbage() {
        let store = MemoryStore::new()
            .with_value(SHOW_DAYS_KEY, "yes")
            .with_value(THEME_KEY, "neon");
        let settings = SettingsStore::load(Box::new(store));

        assert_eq!(settings.preferences(), Preferences::default());
    }

    // ==================== Mutation Tests ====================

    #[test]
    fn test_set_reports_change() {
        let mut settings = SettingsStore::load(Box::new(MemoryStore::new()));

        assert!(settings.set_show_relative_days(true));
        assert!(!settings.set_show_relative_days(true));
        assert!(settings.set_theme(Theme::Dark));
        assert!(!settings.set_theme(Theme::Dark));
    }

    #[test]
    fn test_failed_write_still_applies_in_memory() {
        let mut settings = SettingsStore::load(Box::new(MemoryStore::rejecting_writes()));

        settings.set_show_relative_days(true);
        settings.set_theme(Theme::Dark);

        assert!(settings.preferences().show_relative_days);
        assert_eq!(settings.preferences().theme, Theme::Dark);
    }

    // ==================== JSON File Store Tests ====================

    #[test]
    fn test_json_store_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let mut settings = SettingsStore::load(Box::new(JsonFileStore::new(&path)));
        settings.set_show_relative_days(true);
        settings.set_theme(Theme::Dark);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"syll_show_days\": \"1\""));

        let reloaded = SettingsStore::load(Box::new(JsonFileStore::new(&path)));
        assert!(reloaded.preferences().show_relative_days);
        assert_eq!(reloaded.preferences().theme, Theme::Dark);
    }

    #[test]
    fn test_json_store_corrupt_file_defaults_and_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{not json").unwrap();

        let mut store = JsonFileStore::new(&path);
        assert!(store.get(THEME_KEY).is_err());

        let settings = SettingsStore::load(Box::new(store.clone()));
        assert_eq!(settings.preferences(), Preferences::default());

        store.set(THEME_KEY, "dark").unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }
}
