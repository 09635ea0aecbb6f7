use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::persist::KeyValueStore;
use crate::state::{HistoryEntry, Pick};

pub const HISTORY_KEY: &str = "mlb_pick_history";
pub const HISTORY_DISPLAY_LIMIT: usize = 5;

/// Append-only log of fetched pick snapshots, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickHistory {
    entries: Vec<HistoryEntry>,
    max_entries: Option<usize>,
}

impl PickHistory {
    /// `max_entries` of `None` keeps every snapshot.
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            max_entries: max_entries.filter(|max| *max > 0),
        }
    }

    /// Reads the stored log. Missing or corrupt data yields an empty history.
    pub fn load(store: &dyn KeyValueStore, max_entries: Option<usize>) -> Self {
        let mut history = Self::new(max_entries);
        let Some(raw) = store.get(HISTORY_KEY) else {
            return history;
        };
        match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
            Ok(entries) => {
                history.entries = entries;
                history.enforce_cap();
            }
            Err(err) => {
                tracing::debug!(error = %err, "stored pick history unreadable, starting empty");
            }
        }
        history
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<()> {
        let json = serde_json::to_string(&self.entries).context("serialize pick history")?;
        store.set(HISTORY_KEY, json).context("persist pick history")
    }

    pub fn append(&mut self, picks: Vec<Pick>, date: DateTime<Utc>) -> &HistoryEntry {
        self.entries.push(HistoryEntry { date, picks });
        self.enforce_cap();
        let last = self.entries.len() - 1;
        &self.entries[last]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// The most recent snapshots in chronological order.
    pub fn recent(&self) -> &[HistoryEntry] {
        let start = self.entries.len().saturating_sub(HISTORY_DISPLAY_LIMIT);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    fn enforce_cap(&mut self) {
        if let Some(max) = self.max_entries {
            let excess = self.entries.len().saturating_sub(max);
            if excess > 0 {
                self.entries.drain(..excess);
            }
        }
    }
}
