use thiserror::Error;

/// Failures while reading or writing the persisted notes cache.
/// `load` only logs these; `save` returns them.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("notes cache I/O failed: {0}")]
    Io(#[source] anyhow::Error),
    #[error("notes cache file is not valid JSON")]
    Parse(#[source] serde_json::Error),
    #[error("notes cache could not be serialized")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("no terms to match")]
    NoTerms,
    #[error("invalid term pattern")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("notes-cache - No active note view for {path}")]
    NoActiveView { path: String },
    #[error("notes-cache - Could not open {path}")]
    Open {
        path: String,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    Matcher(#[from] MatcherError),
    #[error("notes-cache - Could not create note: {0}")]
    CreateNote(#[source] anyhow::Error),
}
