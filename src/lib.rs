pub mod cache;
pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod links;
pub mod matcher;
pub mod navigate;
pub mod persist;
pub mod types;
pub mod vault;

use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

pub use crate::cache::NotesCache;
pub use crate::error::{CacheError, MatcherError, NavigationError};
pub use crate::types::{FileRef, IndexedNote, ResultNote};

/// All runtime state shared by the commands.
pub struct NotesState {
    /// Folder holding the notes.
    pub vault_root: PathBuf,
    pub settings: Settings,
    /// The in-memory index. Replaced wholesale on load, mutated per note by
    /// refresh passes.
    pub cache: NotesCache,
    /// True while a refresh pass is running. Prevents overlapping passes.
    pub is_refreshing: bool,
}

impl NotesState {
    pub fn new(vault_root: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            vault_root: vault_root.into(),
            settings,
            cache: NotesCache::new(),
            is_refreshing: false,
        }
    }
}

/// Type alias used by commands and background tasks.
pub type NotesMutex = Mutex<NotesState>;

/// Install the log subscriber. `RUST_LOG` wins when set.
pub fn init_tracing() {
    // Only log WARN and above in production to avoid leaking note content
    #[cfg(debug_assertions)]
    let default_level = "debug";
    #[cfg(not(debug_assertions))]
    let default_level = "warn";

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
