use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cache::NotesCache;
use crate::config::{default_settings_path, load_settings};
use crate::links::{extract_wikilinks, non_existing_links, remove_anchors};
use crate::navigate::{open_note, Pos, Workspace};
use crate::persist::FsAdapter;
use crate::types::{basename_of, FileRef, IndexedNote, ResultNote};
use crate::vault::{build_note, scan_vault, stays_in_vault, VaultWorkspace};
use crate::{NotesMutex, NotesState};

/// What a refresh pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub total_notes: usize,
    pub indexed: usize,
    pub removed: usize,
    pub dangling_added: usize,
    pub dangling_removed: usize,
}

/// Called once on startup: read the settings, then warm the cache from disk
/// when persistence is enabled.
pub async fn startup_init(vault_root: PathBuf) -> NotesState {
    let settings = load_settings(&default_settings_path(&vault_root));
    let mut cache = NotesCache::new();
    cache.load(&FsAdapter::new(&vault_root), &settings).await;
    NotesState {
        vault_root,
        settings,
        cache,
        is_refreshing: false,
    }
}

/// Bring the cache in line with the vault: re-index new and modified notes,
/// drop deleted ones, and track links to notes that don't exist yet.
/// Saves the cache afterwards when persistence is enabled.
pub async fn refresh(state: &NotesMutex) -> Result<RefreshStats> {
    // Guard against overlapping passes
    let root = {
        let mut s = state.lock().await;
        if s.is_refreshing {
            return Ok(RefreshStats::default());
        }
        s.is_refreshing = true;
        s.vault_root.clone()
    };

    let result = refresh_inner(state, root).await;

    state.lock().await.is_refreshing = false;
    result
}

async fn refresh_inner(state: &NotesMutex, root: PathBuf) -> Result<RefreshStats> {
    // 1. List the vault off the async threads
    let scan_root = root.clone();
    let files = tokio::task::spawn_blocking(move || scan_vault(&scan_root))
        .await
        .context("vault scan panicked")??;

    // 2. Drop deleted notes, find the stale ones
    let mut stats = RefreshStats::default();
    let stale: Vec<FileRef> = {
        let mut s = state.lock().await;
        let live: HashSet<&str> = files.iter().map(|f| f.path.as_str()).collect();
        stats.removed = s.cache.remove_missing(&live).len();
        s.cache.stale_files(&files).into_iter().cloned().collect()
    };

    // 3. Read and index stale notes without holding the lock
    let mut fresh: Vec<IndexedNote> = Vec::with_capacity(stale.len());
    for file in &stale {
        match build_note(&root, file).await {
            Ok(note) => fresh.push(note),
            Err(e) => tracing::warn!("Skipping note {}: {e:#}", file.path),
        }
    }
    stats.indexed = fresh.len();

    // 4. Store them and update the dangling placeholders
    let mut s = state.lock().await;
    for note in fresh {
        s.cache.put(note.path.clone(), note);
    }
    let (added, removed) = update_dangling(&mut s.cache, &files);
    stats.dangling_added = added;
    stats.dangling_removed = removed;
    stats.total_notes = s.cache.len();
    let snapshot = s.settings.store_index_in_file.then(|| s.cache.clone());
    drop(s);

    // 5. Persist the snapshot without holding the lock
    if let Some(cache) = snapshot {
        if let Err(e) = cache.save(&FsAdapter::new(&root)).await {
            tracing::warn!("Could not save notes cache: {e:?}");
        }
    }
    Ok(stats)
}

/// Rebuild the placeholders from the links of the indexed notes: every link
/// target without a note gets one, and placeholders nothing links to anymore
/// (or whose note now exists) are dropped.
/// Link targets resolve case-insensitively.
fn update_dangling(cache: &mut NotesCache, files: &[FileRef]) -> (usize, usize) {
    let mut existing: HashSet<String> = HashSet::new();
    for file in files {
        let path = file.path.to_lowercase();
        existing.insert(basename_of(&path).to_string());
        existing.insert(path.strip_suffix(".md").unwrap_or(&path).to_string());
        existing.insert(path);
    }
    let resolves = |target: &str| {
        let target = target.to_lowercase();
        existing.contains(&target) || existing.contains(target.strip_suffix(".md").unwrap_or(&target))
    };

    let mut wanted: Vec<String> = Vec::new();
    for note in cache.notes().filter(|n| !n.does_not_exist) {
        let links = extract_wikilinks(&note.content);
        for link in non_existing_links(&links, resolves) {
            let target = remove_anchors(link).trim().to_string();
            if !wanted.contains(&target) {
                wanted.push(target);
            }
        }
    }

    let obsolete: Vec<String> = cache
        .get_dangling()
        .into_iter()
        .filter(|n| !wanted.contains(&n.path))
        .map(|n| n.path.clone())
        .collect();
    for path in &obsolete {
        cache.remove(path);
    }

    let mut added = 0;
    for target in wanted {
        if !cache.contains(&target) {
            cache.put(target.clone(), IndexedNote::dangling(target));
            added += 1;
        }
    }

    (added, obsolete.len())
}

/// Open the note at `path` in a vault workspace and move the cursor to the
/// first of `words`. Returns where the cursor ended up.
pub async fn open_hit(
    state: &NotesMutex,
    path: &str,
    words: Vec<String>,
    new_pane: bool,
    launch: bool,
) -> Result<Pos> {
    let (root, cached) = {
        let s = state.lock().await;
        let cached = s.cache.get(path).filter(|n| !n.does_not_exist).map(|n| n.content.clone());
        (s.vault_root.clone(), cached)
    };
    let content = match cached {
        Some(content) => content,
        None => read_note(&root, path).await?,
    };

    let item = ResultNote { path: path.to_string(), content, found_words: words };
    let mut workspace = VaultWorkspace::new(root).with_launch(launch);
    open_note(&mut workspace, &item, new_pane).await?;

    workspace
        .active_editor()
        .map(|doc| doc.cursor())
        .context("no active note after navigation")
}

async fn read_note(root: &Path, path: &str) -> Result<String> {
    if !stays_in_vault(path) {
        anyhow::bail!("note path {path} points outside the vault");
    }
    let full = root.join(path);
    tokio::fs::read_to_string(&full)
        .await
        .with_context(|| format!("reading note {}", full.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(paths: &[&str]) -> Vec<FileRef> {
        paths.iter().map(|p| FileRef::new(*p, 1)).collect()
    }

    fn indexed(path: &str, content: &str) -> IndexedNote {
        let mut note = IndexedNote::dangling(path);
        note.does_not_exist = false;
        note.content = content.to_string();
        note
    }

    #[test]
    fn test_update_dangling_adds_and_resolves() {
        let mut cache = NotesCache::new();
        cache.put("a.md", indexed("a.md", "[[b]] [[Later#Top]] [[dir/c]] [[Missing]]"));
        cache.put("Later", IndexedNote::dangling("Later"));

        let (added, removed) =
            update_dangling(&mut cache, &files(&["a.md", "b.md", "dir/c.md", "Later.md"]));

        assert_eq!((added, removed), (1, 1));
        let dangling: Vec<&str> = cache.get_dangling().iter().map(|n| n.path.as_str()).collect();
        assert_eq!(dangling, vec!["Missing"]);
    }

    #[test]
    fn test_update_dangling_drops_unreferenced_placeholders() {
        let mut cache = NotesCache::new();
        cache.put("a.md", indexed("a.md", "[[Kept]]"));
        cache.put("Kept", IndexedNote::dangling("Kept"));
        cache.put("Orphan", IndexedNote::dangling("Orphan"));

        let (added, removed) = update_dangling(&mut cache, &files(&["a.md"]));

        assert_eq!((added, removed), (0, 1));
        let dangling: Vec<&str> = cache.get_dangling().iter().map(|n| n.path.as_str()).collect();
        assert_eq!(dangling, vec!["Kept"]);
    }

    #[test]
    fn test_update_dangling_resolves_case_insensitively() {
        let mut cache = NotesCache::new();
        cache.put("a.md", indexed("a.md", "[[someday]] [[NOTES/B]] [[other.MD]]"));

        let (added, _) = update_dangling(&mut cache, &files(&["a.md", "Someday.md", "notes/b.md", "Other.md"]));

        assert_eq!(added, 0);
        assert!(cache.get_dangling().is_empty());
    }
}
