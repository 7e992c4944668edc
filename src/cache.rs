use std::collections::{HashMap, HashSet};

use crate::types::{FileRef, IndexedNote};

/// In-memory cache of the indexed notes, with all the fields computed for the
/// search engine. Lets notes be de-indexed quickly when they are deleted or
/// updated, and tells the indexer which files need re-indexing.
///
/// All access goes through these methods; the map itself is never handed out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotesCache {
    notes: HashMap<String, IndexedNote>,
}

impl NotesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry. Does not touch the persisted file.
    pub fn reset(&mut self) {
        self.notes = HashMap::new();
    }

    pub fn get(&self, path: &str) -> Option<&IndexedNote> {
        self.notes.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.notes.contains_key(path)
    }

    /// Placeholders for link targets that have no note yet, sorted by path.
    pub fn get_dangling(&self) -> Vec<&IndexedNote> {
        let mut dangling: Vec<&IndexedNote> =
            self.notes.values().filter(|n| n.does_not_exist).collect();
        dangling.sort_by(|a, b| a.path.cmp(&b.path));
        dangling
    }

    /// Insert or replace the whole record at `path`.
    pub fn put(&mut self, path: impl Into<String>, note: IndexedNote) {
        self.notes.insert(path.into(), note);
    }

    pub fn remove(&mut self, path: &str) -> Option<IndexedNote> {
        self.notes.remove(path)
    }

    /// True when the file has never been indexed or changed since it was.
    /// Only presence and mtime are compared, never content.
    pub fn is_stale(&self, file: &FileRef) -> bool {
        match self.notes.get(&file.path) {
            Some(note) => note.mtime != file.mtime,
            None => true,
        }
    }

    /// The subset of `files` that needs re-indexing.
    pub fn stale_files<'a>(&self, files: &'a [FileRef]) -> Vec<&'a FileRef> {
        files.iter().filter(|f| self.is_stale(f)).collect()
    }

    /// Remove indexed notes whose file is gone. Dangling placeholders are kept;
    /// they never had a file in the first place.
    /// Returns the removed paths.
    pub fn remove_missing(&mut self, live_paths: &HashSet<&str>) -> Vec<String> {
        let gone: Vec<String> = self
            .notes
            .values()
            .filter(|n| !n.does_not_exist && !live_paths.contains(n.path.as_str()))
            .map(|n| n.path.clone())
            .collect();
        for path in &gone {
            self.notes.remove(path);
        }
        gone
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.notes.keys().map(String::as_str)
    }

    pub fn notes(&self) -> impl Iterator<Item = &IndexedNote> {
        self.notes.values()
    }

    /// Replace the whole mapping, e.g. with one read from disk.
    pub(crate) fn replace(&mut self, notes: HashMap<String, IndexedNote>) {
        self.notes = notes;
    }

    pub(crate) fn as_map(&self) -> &HashMap<String, IndexedNote> {
        &self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(path: &str, mtime: i64) -> IndexedNote {
        IndexedNote {
            content: format!("content of {path}"),
            does_not_exist: false,
            mtime,
            ..IndexedNote::dangling(path)
        }
    }

    #[test]
    fn test_put_then_get() {
        let mut cache = NotesCache::new();
        let n = note("a.md", 10);
        cache.put("a.md", n.clone());
        assert_eq!(cache.get("a.md"), Some(&n));
    }

    #[test]
    fn test_put_replaces_wholesale() {
        let mut cache = NotesCache::new();
        let mut first = note("a.md", 10);
        first.tags = vec!["#old".into()];
        cache.put("a.md", first);
        cache.put("a.md", note("a.md", 20));

        let stored = cache.get("a.md").unwrap();
        assert_eq!(stored.mtime, 20);
        assert!(stored.tags.is_empty());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cache = NotesCache::new();
        cache.put("a.md", note("a.md", 1));
        assert!(cache.remove("a.md").is_some());
        assert!(cache.get("a.md").is_none());
        assert!(cache.remove("a.md").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut cache = NotesCache::new();
        cache.put("a.md", note("a.md", 1));
        cache.put("b.md", note("b.md", 2));
        cache.reset();
        assert!(cache.get("a.md").is_none());
        assert!(cache.get("b.md").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_is_stale() {
        let mut cache = NotesCache::new();
        assert!(cache.is_stale(&FileRef::new("a.md", 100)));

        cache.put("a.md", note("a.md", 100));
        assert!(!cache.is_stale(&FileRef::new("a.md", 100)));
        assert!(cache.is_stale(&FileRef::new("a.md", 101)));
    }

    #[test]
    fn test_get_dangling() {
        let mut cache = NotesCache::new();
        cache.put("C", IndexedNote::dangling("C"));
        cache.put("A", note("A", 1));
        cache.put("B", IndexedNote::dangling("B"));

        let paths: Vec<&str> = cache.get_dangling().iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["B", "C"]);
    }

    #[test]
    fn test_stale_files() {
        let mut cache = NotesCache::new();
        cache.put("a.md", note("a.md", 1));
        cache.put("b.md", note("b.md", 2));
        let files = vec![
            FileRef::new("a.md", 1),
            FileRef::new("b.md", 3),
            FileRef::new("c.md", 1),
        ];
        let stale: Vec<&str> = cache.stale_files(&files).iter().map(|f| f.path.as_str()).collect();
        assert_eq!(stale, vec!["b.md", "c.md"]);
    }

    #[test]
    fn test_remove_missing_keeps_placeholders() {
        let mut cache = NotesCache::new();
        cache.put("a.md", note("a.md", 1));
        cache.put("gone.md", note("gone.md", 1));
        cache.put("Ghost", IndexedNote::dangling("Ghost"));

        let live: HashSet<&str> = ["a.md"].into_iter().collect();
        let removed = cache.remove_missing(&live);

        assert_eq!(removed, vec!["gone.md".to_string()]);
        assert!(cache.contains("a.md"));
        assert!(cache.contains("Ghost"));
    }
}
