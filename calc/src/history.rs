//! Completed-calculation events and the sinks that receive them.

use std::sync::atomic::{AtomicU64, Ordering};

use glasscalc_common::{now, Timestamp};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which feature produced a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Standard,
    Tip,
    Discount,
    Split,
    Currency,
    Unit,
}

/// A completed calculation, as handed to the history sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub result_display: String,
    pub expression_trace: String,
    pub category: Category,
    pub created_at: Timestamp,
}

impl HistoryEntry {
    pub fn new(
        result_display: impl Into<String>,
        expression_trace: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            result_display: result_display.into(),
            expression_trace: expression_trace.into(),
            category,
            created_at: now(),
        }
    }
}

/// Receives completed calculations. Persistence is up to the implementor.
pub trait HistorySink: Send + Sync {
    fn save(&self, entry: HistoryEntry);
}

/// Receives a fire-and-forget signal per completed calculation.
pub trait UsageCounter: Send + Sync {
    fn calculation_completed(&self);
}

/// History sink that keeps entries in memory, newest last.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all saved entries.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl HistorySink for InMemoryHistory {
    fn save(&self, entry: HistoryEntry) {
        self.entries.lock().push(entry);
    }
}

/// Usage counter backed by an atomic.
#[derive(Debug, Default)]
pub struct CountingUsage {
    completed: AtomicU64,
}

impl CountingUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}

impl UsageCounter for CountingUsage {
    fn calculation_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}
