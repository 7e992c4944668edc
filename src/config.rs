use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Folder where the cache keeps its own files inside a vault.
pub const DATA_DIR: &str = ".notes-cache";

/// Where new notes are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NewFileLocation {
    #[default]
    Root,
    /// Next to the note that is currently active.
    Current,
    /// In `new_file_folder_path`.
    Folder,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Persist the notes cache between runs.
    #[serde(default)]
    pub store_index_in_file: bool,
    #[serde(default)]
    pub new_file_location: NewFileLocation,
    #[serde(default)]
    pub new_file_folder_path: String,
}

pub fn default_settings_path(vault_root: &Path) -> PathBuf {
    vault_root.join(DATA_DIR).join("settings.json")
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings(path: &Path) -> Settings {
    let Ok(bytes) = fs::read(path) else {
        return Settings::default();
    };
    serde_json::from_slice::<Settings>(&bytes).unwrap_or_else(|e| {
        tracing::warn!("Ignoring invalid settings file {}: {e}", path.display());
        Settings::default()
    })
}

pub fn save_settings(path: &Path, settings: &Settings) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(settings)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    Ok(())
}
