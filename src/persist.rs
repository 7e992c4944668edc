use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::cache::NotesCache;
use crate::config::Settings;
use crate::error::CacheError;
use crate::types::IndexedNote;

/// Location of the persisted cache, relative to the storage root.
pub const NOTES_CACHE_FILE_PATH: &str = ".notes-cache/notesCache.json";

/// Raw file access provided by the host. Paths are relative to the host's
/// storage root.
#[allow(async_fn_in_trait)]
pub trait StorageAdapter {
    async fn exists(&self, path: &str) -> anyhow::Result<bool>;
    async fn read(&self, path: &str) -> anyhow::Result<String>;
    async fn write(&self, path: &str, data: &str) -> anyhow::Result<()>;
}

/// Storage adapter over a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsAdapter {
    root: PathBuf,
}

impl FsAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl StorageAdapter for FsAdapter {
    async fn exists(&self, path: &str) -> anyhow::Result<bool> {
        Ok(tokio::fs::try_exists(self.resolve(path)).await?)
    }

    async fn read(&self, path: &str) -> anyhow::Result<String> {
        let full = self.resolve(path);
        tokio::fs::read_to_string(&full)
            .await
            .with_context(|| format!("reading {}", full.display()))
    }

    /// Writes to a temp file alongside the target, then renames it over the
    /// target so readers never see a partial file.
    async fn write(&self, path: &str, data: &str) -> anyhow::Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = full.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, data)
            .await
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &full).await?;
        Ok(())
    }
}

impl NotesCache {
    /// Warm the cache from the persisted file when `store_index_in_file` is on.
    ///
    /// Never fails: a missing, unreadable or corrupt file is logged and the
    /// cache is left empty, to be rebuilt by normal indexing.
    pub async fn load<A: StorageAdapter>(&mut self, adapter: &A, settings: &Settings) {
        if settings.store_index_in_file {
            match read_notes_cache(adapter).await {
                Ok(Some(notes)) => {
                    self.replace(notes);
                    tracing::info!("Notes cache loaded from the file ({} notes)", self.len());
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("Could not load notes cache from the file: {e:?}");
                    self.reset();
                }
            }
        }
    }

    /// Write the whole cache to the persisted file, replacing the previous one.
    /// Callers decide whether persistence is enabled.
    pub async fn save<A: StorageAdapter>(&self, adapter: &A) -> Result<(), CacheError> {
        let json = serde_json::to_string(self.as_map()).map_err(CacheError::Serialize)?;
        adapter
            .write(NOTES_CACHE_FILE_PATH, &json)
            .await
            .map_err(CacheError::Io)?;
        tracing::info!("Notes cache saved to the file ({} notes)", self.len());
        Ok(())
    }
}

/// `Ok(None)` when there is nothing persisted yet.
async fn read_notes_cache<A: StorageAdapter>(
    adapter: &A,
) -> Result<Option<HashMap<String, IndexedNote>>, CacheError> {
    if !adapter.exists(NOTES_CACHE_FILE_PATH).await.map_err(CacheError::Io)? {
        return Ok(None);
    }
    let json = adapter.read(NOTES_CACHE_FILE_PATH).await.map_err(CacheError::Io)?;
    let notes = serde_json::from_str(&json).map_err(CacheError::Parse)?;
    Ok(Some(notes))
}
