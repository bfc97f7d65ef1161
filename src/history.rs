//! Announcement history.
//!
//! Stored as a single JSON array (`timestamp`, `item`, `page`, `number`)
//! that is rewritten after every append.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::catalog::Item;
use crate::error::{AnnouncerError, Result};

/// Record of a single announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    #[serde(rename = "item")]
    pub item_text: String,
    pub page: u32,
    #[serde(rename = "number")]
    pub ordinal: u32,
}

impl HistoryEntry {
    pub fn now(item: &Item) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            item_text: item.text.clone(),
            page: item.page,
            ordinal: item.ordinal,
        }
    }
}

pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Read the history at `path`. A missing file is an empty history.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No history at {}, starting empty", path.display());
                return Ok(Self::empty(path));
            }
            Err(e) => {
                // Unreadable and unparsable are treated alike.
                return Err(AnnouncerError::HistoryCorrupt {
                    path,
                    reason: e.to_string(),
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(Self::empty(path));
        }

        match serde_json::from_str::<Vec<HistoryEntry>>(&contents) {
            Ok(entries) => {
                debug!("Loaded {} history entries from {}", entries.len(), path.display());
                Ok(Self { path, entries })
            }
            Err(e) => Err(AnnouncerError::HistoryCorrupt {
                path,
                reason: e.to_string(),
            }),
        }
    }

    /// Like [`HistoryStore::load`], but a corrupt file degrades to an empty
    /// history that keeps writing to the same path.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load(path.clone()) {
            Ok(store) => store,
            Err(e) => {
                error!("{e}; starting with empty history");
                Self::empty(path)
            }
        }
    }

    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    /// Append in memory, then flush the whole history to disk.
    ///
    /// The in-memory entry is kept even when the write fails.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<()> {
        self.entries.push(entry);
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        let write_failed = |source: std::io::Error| AnnouncerError::HistoryWriteFailed {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(write_failed)?;
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| write_failed(std::io::Error::other(e)))?;

        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).map_err(write_failed)?;
        file.write_all(json.as_bytes()).map_err(write_failed)?;
        file.sync_all().map_err(write_failed)?;
        fs::rename(&tmp, &self.path).map_err(write_failed)?;

        debug!("Saved {} history entries to {}", self.entries.len(), self.path.display());
        Ok(())
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> &[HistoryEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn display_time(timestamp: &str) -> String {
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| {
            warn!("Unparsable history timestamp: {timestamp}");
            timestamp.to_string()
        })
}

/// Render entries for display, one line each.
pub fn format_recent(entries: &[HistoryEntry], max_chars: usize) -> String {
    if entries.is_empty() {
        return "No announcement history available.".to_string();
    }

    let mut out = String::from("Announcement History:\n\n");
    for entry in entries {
        out.push_str(&format!(
            "{} - Page {}, #{}: {}...\n",
            display_time(&entry.timestamp),
            entry.page,
            entry.ordinal,
            truncate(&entry.item_text, max_chars)
        ));
    }
    out
}
