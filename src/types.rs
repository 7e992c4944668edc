use serde::{Deserialize, Serialize};

/// One cached, indexed note with the fields computed for the search engine.
/// Keyed by `path` in the notes cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedNote {
    pub path: String,
    #[serde(default)]
    pub basename: String,
    pub mtime: i64, // Unix timestamp in ms
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub aliases: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub headings1: String,
    #[serde(default)]
    pub headings2: String,
    #[serde(default)]
    pub headings3: String,
    /// True for placeholders standing in for a link target that has no note yet.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub does_not_exist: bool,
    /// Fields written by the search engine that this crate does not interpret.
    /// Kept so a persisted cache round-trips without loss.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl IndexedNote {
    /// Placeholder record for a link target that does not exist (yet).
    pub fn dangling(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            basename: basename_of(&path).to_string(),
            path,
            mtime: 0,
            content: String::new(),
            aliases: String::new(),
            tags: Vec::new(),
            headings1: String::new(),
            headings2: String::new(),
            headings3: String::new(),
            does_not_exist: true,
            extra: serde_json::Map::new(),
        }
    }
}

/// A search hit as handed over by the search engine. Consumed by navigation only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultNote {
    pub path: String,
    pub content: String,
    pub found_words: Vec<String>,
}

/// A live document reference: where it is and when it last changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub path: String,
    pub mtime: i64, // Unix timestamp in ms
}

impl FileRef {
    pub fn new(path: impl Into<String>, mtime: i64) -> Self {
        Self { path: path.into(), mtime }
    }
}

/// File name without folders and without the `.md` extension.
pub fn basename_of(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.strip_suffix(".md").unwrap_or(name)
}
