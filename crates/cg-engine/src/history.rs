//! Append-only history log with fixed-anchor grouping.
//!
//! An update joins the last entry iff `update.timestamp - last.anchor_timestamp
//! < grouping_window_ms`. The comparison is against the entry's *anchor* (its
//! first update), not the most recently appended update, so a long burst
//! fragments once it has run for a full window since the anchor.

use crate::{CellUpdate, HistoryEntry, TimestampMs};

#[derive(Clone, Debug)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
    grouping_window_ms: i64,
}

impl HistoryLog {
    pub fn new(grouping_window_ms: i64) -> Self {
        Self {
            entries: Vec::new(),
            grouping_window_ms,
        }
    }

    pub fn append(&mut self, update: CellUpdate) {
        if let Some(last) = self.entries.last_mut() {
            if update.timestamp.saturating_sub(last.anchor_timestamp) < self.grouping_window_ms {
                last.updates.push(update);
                return;
            }
        }
        self.entries.push(HistoryEntry {
            anchor_timestamp: update.timestamp,
            updates: vec![update],
        });
    }

    /// All entries, oldest first.
    pub fn all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Timestamp of the most recently appended update.
    pub fn latest_timestamp(&self) -> Option<TimestampMs> {
        self.entries
            .last()
            .and_then(|e| e.updates.last())
            .map(|u| u.timestamp)
    }

    /// Updates in log order.
    pub fn updates(&self) -> impl Iterator<Item = &CellUpdate> {
        self.entries.iter().flat_map(|e| e.updates.iter())
    }
}
