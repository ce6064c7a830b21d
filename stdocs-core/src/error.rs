use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Failure to build the highlighter.
///
/// `Clone` so that every caller joined on the same pending construction
/// receives the same error.
#[derive(Debug, Clone, Error)]
pub enum ConstructionError {
    #[error("failed to load highlighter backend from {path}: {source}")]
    BackendLoad {
        path: PathBuf,
        source: Arc<std::io::Error>,
    },

    #[error("highlighter backend is unreadable: {0}")]
    BackendDecode(String),

    #[error("highlighter backend task failed: {0}")]
    BackendTask(String),

    #[error("malformed grammar: {0}")]
    Grammar(String),

    #[error("invalid theme: {0}")]
    Theme(String),

    /// Too many consecutive failures; construction is no longer attempted.
    #[error("highlighter construction gave up after {attempts} consecutive failures: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<ConstructionError>,
    },
}

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("unknown language '{0}'")]
    UnknownLanguage(String),

    #[error(transparent)]
    Syntect(#[from] syntect::Error),
}
