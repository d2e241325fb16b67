//! Persistent user settings.
//!
//! Settings are stored as a small JSON document:
//!
//! ```json
//! {
//!   "custom_rules": { ".mp4": "My_Movies" },
//!   "dry_run": false,
//!   "delete_empty": false
//! }
//! ```
//!
//! Loading never fails: a missing or unreadable file yields the defaults.
//! Every change rewrites the whole file.

use crate::file_category::{ExtensionTable, RuleError};
use crate::session::SessionOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the settings document inside the config directory.
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Errors that can occur while writing settings.
#[derive(Debug)]
pub enum SettingsError {
    /// The file or its directory could not be written.
    Io { path: PathBuf, source: std::io::Error },
    /// Settings could not be encoded as JSON.
    Serialize(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            SettingsError::Serialize(msg) => write!(f, "JSON serialization failed: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

/// The user's saved preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Extension overrides applied before the built-in table.
    pub custom_rules: ExtensionTable,
    /// Preview runs without touching the filesystem.
    pub dry_run: bool,
    /// Remove empty directories after organizing.
    pub delete_empty: bool,
}

impl Settings {
    /// Session options derived from the saved flags.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            dry_run: self.dry_run,
            delete_empty_dirs: self.delete_empty,
        }
    }
}

/// Default location: `<config dir>/foldersort/settings.json`.
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("foldersort")
        .join(SETTINGS_FILE_NAME)
}

/// Settings bound to the file they are persisted in.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Loads settings from `path`, falling back to defaults when the file is
    /// missing or malformed. Keys absent from the file take their defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self { path, settings }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn rules(&self) -> &ExtensionTable {
        &self.settings.custom_rules
    }

    /// Writes the full settings document, creating parent directories.
    pub fn save(&self) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| SettingsError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(&self.path, json).map_err(|e| SettingsError::Io {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Adds or updates a custom rule in memory and returns the normalized
    /// pair. Call [`SettingsStore::save`] to persist it.
    pub fn add_rule(&mut self, extension: &str, folder: &str) -> Result<(String, String), RuleError> {
        self.settings.custom_rules.insert(extension, folder)
    }

    pub fn set_dry_run(&mut self, enabled: bool) {
        self.settings.dry_run = enabled;
    }

    pub fn set_delete_empty(&mut self, enabled: bool) {
        self.settings.delete_empty = enabled;
    }
}
