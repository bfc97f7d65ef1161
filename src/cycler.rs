//! Announcement cycler: walks the selection one item per tick, wrapping
//! back to the start once every item has been announced.
//!
//! Idle (empty selection) → `NoSelection`; Ready → speak, record, advance.
//! A failed utterance leaves the cursor in place so the same item is
//! retried on the next tick.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::catalog::Item;
use crate::error::{AnnouncerError, Result};
use crate::history::{truncate, HistoryEntry, HistoryStore};
use crate::selector::Selection;
use crate::speech::{Speaker, VoiceSettings};

/// What a successful tick announced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub item: Item,
    pub message: String,
    /// Cursor after advancing.
    pub cursor: usize,
    /// The cursor had run past the end and was reset before this tick.
    pub wrapped: bool,
}

pub fn announcement_text(item: &Item) -> String {
    format!(
        "Time to work on item number {} from page {}: {}",
        item.ordinal, item.page, item.text
    )
}

pub struct AnnouncementCycler {
    selection: Selection,
    cursor: usize,
    speaker: Arc<dyn Speaker>,
    voice: VoiceSettings,
    history: HistoryStore,
}

impl AnnouncementCycler {
    pub fn new(speaker: Arc<dyn Speaker>, voice: VoiceSettings, history: HistoryStore) -> Self {
        Self {
            selection: Vec::new(),
            cursor: 0,
            speaker,
            voice,
            history,
        }
    }

    /// Swap in a new selection and start over from its first item.
    pub fn replace_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.cursor = 0;
    }

    /// Announce the item under the cursor.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.selection.is_empty() {
            warn!("tick: no items selected");
            return Err(AnnouncerError::NoSelection);
        }

        let wrapped = self.cursor >= self.selection.len();
        if wrapped {
            info!("All items have been announced, starting over");
            self.cursor = 0;
        }

        let item = self.selection[self.cursor].clone();
        let message = announcement_text(&item);
        info!("Announcing: {message}");

        if let Err(e) = self.speaker.speak(&message, &self.voice) {
            error!(
                "tick: announcement of page {} #{} failed: {e}",
                item.page, item.ordinal
            );
            return Err(AnnouncerError::AnnouncementFailed(e));
        }

        if let Err(e) = self.history.append(HistoryEntry::now(&item)) {
            error!("tick: {e}");
        }
        self.cursor += 1;

        Ok(TickOutcome {
            item,
            message,
            cursor: self.cursor,
            wrapped,
        })
    }

    /// The first `limit` selected items. Does not touch the cursor.
    pub fn peek_preview(&self, limit: usize) -> &[Item] {
        &self.selection[..limit.min(self.selection.len())]
    }

    pub fn selection(&self) -> &[Item] {
        &self.selection
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }
}

/// Numbered preview lines, with a trailer when items were left out.
pub fn format_preview(items: &[Item], total: usize, max_item_chars: usize) -> String {
    if total == 0 {
        return "No items selected".to_string();
    }

    let mut out = String::from("Preview of selected items:\n");
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!(
            "{}. (Page {}, #{}) {}...\n",
            i + 1,
            item.page,
            item.ordinal,
            truncate(&item.text, max_item_chars)
        ));
    }
    if total > items.len() {
        out.push_str(&format!("... and {} more items\n", total - items.len()));
    }
    out
}
