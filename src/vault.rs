use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use crate::document::TextDocument;
use crate::navigate::{ViewId, ViewInfo, ViewKind, Workspace};
use crate::types::{basename_of, FileRef, IndexedNote};

/// List every markdown note of the vault with its modification time.
/// Hidden files and folders (including the cache's own folder) are skipped.
/// Paths are relative to `root` and always use `/`.
pub fn scan_vault(root: &Path) -> Result<Vec<FileRef>> {
    if !root.is_dir() {
        anyhow::bail!("vault folder {} does not exist", root.display());
    }
    let files = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|entry| {
            entry
                .map_err(|e| tracing::warn!("Skipping unreadable vault entry: {e}"))
                .ok()
        })
        .filter(|e| e.file_type().is_file() && e.path().extension().is_some_and(|x| x == "md"))
        .filter_map(|e| {
            let mtime = e.metadata().ok()?.modified().ok().map(to_millis)?;
            Some(FileRef::new(relative_path(root, e.path())?, mtime))
        })
        .collect();
    Ok(files)
}

/// Read a note from the vault and compute its indexed fields.
pub async fn build_note(root: &Path, file: &FileRef) -> Result<IndexedNote> {
    let full = root.join(&file.path);
    let content = tokio::fs::read_to_string(&full)
        .await
        .with_context(|| format!("reading note {}", full.display()))?;

    let mut note = IndexedNote::dangling(file.path.clone());
    note.does_not_exist = false;
    note.basename = basename_of(&file.path).to_string();
    note.mtime = file.mtime;
    note.tags = extract_tags(&content);
    note.headings1 = headings(&content, 1);
    note.headings2 = headings(&content, 2);
    note.headings3 = headings(&content, 3);
    note.content = content;
    Ok(note)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
}

/// Only plain relative paths: no root, prefix or `..` components.
pub(crate) fn stays_in_vault(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel.components().filter_map(|c| c.as_os_str().to_str()).collect();
    Some(parts.join("/"))
}

fn to_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn extract_tags(content: &str) -> Vec<String> {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let re = TAG.get_or_init(|| Regex::new(r"(?:^|\s)(#[\w/-]+)").expect("tag pattern is valid"));
    let mut tags: Vec<String> = Vec::new();
    for cap in re.captures_iter(content) {
        let tag = cap[1].to_string();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Text of the headings of the given level, space separated.
fn headings(content: &str, level: usize) -> String {
    let marker = format!("{} ", "#".repeat(level));
    content
        .lines()
        .filter_map(|l| l.strip_prefix(&marker))
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}

struct VaultView {
    info: ViewInfo,
    doc: TextDocument,
}

/// Workspace over a vault folder: every open note is a `TextDocument`.
/// Optionally hands opened notes to the system's default application.
pub struct VaultWorkspace {
    root: PathBuf,
    views: Vec<VaultView>,
    active: Option<ViewId>,
    launch: bool,
}

impl VaultWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), views: Vec::new(), active: None, launch: false }
    }

    /// Also open notes with the system handler (`xdg-open`, `open`, ShellExecute).
    pub fn with_launch(mut self, launch: bool) -> Self {
        self.launch = launch;
        self
    }

    pub fn pin(&mut self, id: ViewId, pinned: bool) {
        if let Some(view) = self.views.get_mut(id) {
            view.info.pinned = pinned;
        }
    }

    pub fn active_view(&self) -> Option<ViewId> {
        self.active
    }

    /// `Note` and `Note.md` both name `Note.md`.
    fn note_path(path: &str) -> String {
        if path.ends_with(".md") {
            path.to_string()
        } else {
            format!("{path}.md")
        }
    }
}

impl Workspace for VaultWorkspace {
    type Editor = TextDocument;

    fn views(&self) -> Vec<ViewInfo> {
        self.views.iter().map(|v| v.info.clone()).collect()
    }

    fn set_active_view(&mut self, id: ViewId) {
        if id < self.views.len() {
            self.active = Some(id);
        }
    }

    /// Missing notes are created empty.
    async fn open_link(&mut self, path: &str, new_pane: bool) -> Result<()> {
        let path = Self::note_path(path);
        if !stays_in_vault(&path) {
            anyhow::bail!("note path {path} points outside the vault");
        }
        let full = self.root.join(&path);
        if !tokio::fs::try_exists(&full).await? {
            if let Some(parent) = full.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&full, "").await?;
            tracing::info!("Created note {path}");
        }
        let content = tokio::fs::read_to_string(&full)
            .await
            .with_context(|| format!("reading note {}", full.display()))?;

        let reusable = self
            .active
            .filter(|_| !new_pane)
            .filter(|&id| !self.views[id].info.pinned && self.views[id].info.kind == ViewKind::Markdown);
        let id = match reusable {
            Some(id) => {
                let view = &mut self.views[id];
                view.info.path = Some(path.clone());
                view.doc = TextDocument::new(content);
                id
            }
            None => {
                let id = self.views.len();
                self.views.push(VaultView {
                    info: ViewInfo { id, kind: ViewKind::Markdown, path: Some(path.clone()), pinned: false },
                    doc: TextDocument::new(content),
                });
                id
            }
        };
        self.active = Some(id);

        if self.launch {
            open::that_detached(&full).with_context(|| format!("launching {}", full.display()))?;
        }
        Ok(())
    }

    fn active_editor(&mut self) -> Option<&mut TextDocument> {
        let view = self.views.get_mut(self.active?)?;
        (view.info.kind == ViewKind::Markdown).then_some(&mut view.doc)
    }

    fn active_file(&self) -> Option<String> {
        self.views.get(self.active?)?.info.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::NavigationError;
    use crate::navigate::create_note;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_vault_skips_hidden_and_non_markdown() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::create_dir_all(dir.path().join(".notes-cache")).unwrap();
        fs::write(dir.path().join("a.md"), "a").unwrap();
        fs::write(dir.path().join("sub/deeper/b.md"), "b").unwrap();
        fs::write(dir.path().join("image.png"), "x").unwrap();
        fs::write(dir.path().join(".notes-cache/c.md"), "c").unwrap();

        let mut paths: Vec<String> = scan_vault(dir.path()).unwrap().into_iter().map(|f| f.path).collect();
        paths.sort();
        assert_eq!(paths, vec!["a.md", "sub/deeper/b.md"]);
    }

    #[test]
    fn test_scan_missing_vault_fails() {
        let dir = TempDir::new().unwrap();
        assert!(scan_vault(&dir.path().join("nope")).is_err());
    }

    #[tokio::test]
    async fn test_build_note() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Rust.md"),
            "# Ownership\nBorrowing #lang/rust and #lang/rust\n## Lifetimes\n### Elision\n",
        )
        .unwrap();
        let note = build_note(dir.path(), &FileRef::new("Rust.md", 7)).await.unwrap();

        assert_eq!(note.basename, "Rust");
        assert_eq!(note.mtime, 7);
        assert!(!note.does_not_exist);
        assert_eq!(note.tags, vec!["#lang/rust".to_string()]);
        assert_eq!(note.headings1, "Ownership");
        assert_eq!(note.headings2, "Lifetimes");
        assert_eq!(note.headings3, "Elision");
    }

    #[tokio::test]
    async fn test_open_link_reuses_unpinned_view() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "aaa").unwrap();
        fs::write(dir.path().join("b.md"), "bbb").unwrap();
        let mut ws = VaultWorkspace::new(dir.path());

        ws.open_link("a", false).await.unwrap();
        ws.open_link("b.md", false).await.unwrap();
        assert_eq!(ws.views().len(), 1);
        assert_eq!(ws.active_file().as_deref(), Some("b.md"));
        assert_eq!(ws.active_editor().unwrap().text(), "bbb");

        ws.pin(0, true);
        ws.open_link("a.md", false).await.unwrap();
        assert_eq!(ws.views().len(), 2);

        ws.open_link("b.md", true).await.unwrap();
        assert_eq!(ws.views().len(), 3);
    }

    #[tokio::test]
    async fn test_open_link_creates_missing_note() {
        let dir = TempDir::new().unwrap();
        let mut ws = VaultWorkspace::new(dir.path());
        ws.open_link("Inbox/New", false).await.unwrap();
        assert!(dir.path().join("Inbox/New.md").is_file());
        assert_eq!(ws.active_editor().unwrap().text(), "");
    }

    #[tokio::test]
    async fn test_open_link_rejects_paths_outside_vault() {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().join("vault");
        fs::create_dir_all(&vault).unwrap();
        let mut ws = VaultWorkspace::new(&vault);

        assert!(ws.open_link("../escaped", false).await.is_err());
        assert!(ws.open_link("sub/../../escaped", false).await.is_err());
        assert!(ws.open_link("/tmp/escaped", false).await.is_err());
        assert!(!dir.path().join("escaped.md").exists());
        assert!(ws.views().is_empty());
    }

    #[tokio::test]
    async fn test_create_note_cannot_escape_vault() {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().join("vault");
        fs::create_dir_all(&vault).unwrap();
        let mut ws = VaultWorkspace::new(&vault);

        let err = create_note(&mut ws, &Settings::default(), "../x", false).await.unwrap_err();
        assert!(matches!(err, NavigationError::CreateNote(_)));
        assert!(!dir.path().join("x.md").exists());

        create_note(&mut ws, &Settings::default(), "inside", false).await.unwrap();
        assert!(vault.join("inside.md").is_file());
    }
}
