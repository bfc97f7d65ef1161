//! Error taxonomy for scav-announcer-rs.
//!
//! Every per-operation failure is returned typed so the menu layer can decide
//! whether to retry or prompt again. Only `DocumentUnavailable` is fatal.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, AnnouncerError>;

#[derive(Debug, thiserror::Error)]
pub enum AnnouncerError {
    #[error("document {} unavailable: {reason}", path.display())]
    DocumentUnavailable { path: PathBuf, reason: String },

    #[error("invalid range {start}..={end}: item numbers must lie within 1..={total}")]
    InvalidRange { start: u32, end: u32, total: usize },

    #[error("no items selected")]
    NoSelection,

    #[error("announcement failed: {0}")]
    AnnouncementFailed(#[source] SpeechError),

    #[error("history file {} is corrupt: {reason}", path.display())]
    HistoryCorrupt { path: PathBuf, reason: String },

    #[error("failed to write history file {}: {source}", path.display())]
    HistoryWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("announcement task failed: {0}")]
    TaskFailed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Failure reported by a [`crate::speech::Speaker`].
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code:?}")]
    ExitStatus { program: String, code: Option<i32> },

    #[error("unsupported speech backend: {0}")]
    UnsupportedBackend(String),
}
