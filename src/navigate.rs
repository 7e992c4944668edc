use crate::config::{NewFileLocation, Settings};
use crate::error::{MatcherError, NavigationError};
use crate::matcher::TermMatcher;
use crate::types::ResultNote;

/// Lines kept visible above and below the cursor after navigating to a hit.
pub const CONTEXT_LINES: usize = 10;

/// Cursor position in a note, 0-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub ch: usize,
}

/// Cursor and viewport control over an open note.
pub trait Editor {
    /// Convert a byte offset into the note text to a line/column position.
    fn offset_to_pos(&self, offset: usize) -> Pos;
    fn set_cursor(&mut self, pos: Pos);
    fn scroll_into_view(&mut self, from: Pos, to: Pos);
}

pub type ViewId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewKind {
    /// A note editor, the only kind navigation can put a cursor in.
    Markdown,
    Other(String),
}

/// Snapshot of one view open in the host workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewInfo {
    pub id: ViewId,
    pub kind: ViewKind,
    /// Note shown by the view, if any.
    pub path: Option<String>,
    pub pinned: bool,
}

/// The host's view management.
#[allow(async_fn_in_trait)]
pub trait Workspace {
    type Editor: Editor;

    fn views(&self) -> Vec<ViewInfo>;
    fn set_active_view(&mut self, id: ViewId);
    /// Open (or focus) the note at `path`. Resolves once the view is settled.
    async fn open_link(&mut self, path: &str, new_pane: bool) -> anyhow::Result<()>;
    /// Editor of the active markdown view.
    fn active_editor(&mut self) -> Option<&mut Self::Editor>;
    /// Path of the note in the active view.
    fn active_file(&self) -> Option<String>;
}

/// A pinned markdown view already showing `path`.
pub fn find_pinned_view(views: &[ViewInfo], path: &str) -> Option<ViewId> {
    views
        .iter()
        .filter(|v| v.kind == ViewKind::Markdown)
        .find(|v| v.pinned && v.path.as_deref() == Some(path))
        .map(|v| v.id)
}

/// Byte offset just past the first found word in the note content, or `None`
/// when no found word occurs in it anymore.
pub fn target_offset(item: &ResultNote) -> Result<Option<usize>, MatcherError> {
    let mut matcher = match TermMatcher::new(&item.found_words) {
        Ok(m) => m,
        Err(MatcherError::NoTerms) => return Ok(None),
        Err(e) => return Err(e),
    };
    Ok(matcher.exec(&item.content).map(|_| matcher.last_index()))
}

/// Open a search hit and put the cursor at the start of the line holding the
/// first found word, with some context visible around it.
///
/// A pinned view already showing the note is reused instead of opening the
/// note a second time, unless `new_pane` is set.
pub async fn open_note<W: Workspace>(
    workspace: &mut W,
    item: &ResultNote,
    new_pane: bool,
) -> Result<(), NavigationError> {
    let offset = target_offset(item)?;

    let pinned = if new_pane {
        None
    } else {
        find_pinned_view(&workspace.views(), &item.path)
    };
    match pinned {
        Some(id) => {
            tracing::debug!("Reusing pinned view {id} for {}", item.path);
            workspace.set_active_view(id);
        }
        None => {
            workspace
                .open_link(&item.path, new_pane)
                .await
                .map_err(|source| NavigationError::Open { path: item.path.clone(), source })?;
        }
    }

    let editor = workspace
        .active_editor()
        .ok_or_else(|| NavigationError::NoActiveView { path: item.path.clone() })?;

    let Some(offset) = offset else {
        tracing::debug!("None of the found words occur in {}, cursor left as is", item.path);
        return Ok(());
    };
    let mut pos = editor.offset_to_pos(offset);
    pos.ch = 0;

    editor.set_cursor(pos);
    editor.scroll_into_view(
        Pos { line: pos.line.saturating_sub(CONTEXT_LINES), ch: 0 },
        Pos { line: pos.line + CONTEXT_LINES, ch: 0 },
    );
    Ok(())
}

/// Create (open) a new note named `name`, in the folder chosen by the
/// `new_file_location` setting.
pub async fn create_note<W: Workspace>(
    workspace: &mut W,
    settings: &Settings,
    name: &str,
    new_pane: bool,
) -> Result<(), NavigationError> {
    let prefix = match settings.new_file_location {
        NewFileLocation::Current => {
            let parent = workspace
                .active_file()
                .and_then(|f| f.rsplit_once('/').map(|(dir, _)| dir.to_string()))
                .unwrap_or_default();
            folder_prefix(&parent)
        }
        NewFileLocation::Folder => folder_prefix(&settings.new_file_folder_path),
        NewFileLocation::Root => String::new(),
    };
    let path = format!("{prefix}{name}.md");

    workspace.open_link(&path, new_pane).await.map_err(|e| {
        let err = NavigationError::CreateNote(e);
        tracing::error!("{err:?}");
        err
    })
}

fn folder_prefix(folder: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        String::new()
    } else {
        format!("{folder}/")
    }
}
