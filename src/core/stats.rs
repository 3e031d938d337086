//! Statistics tracking for sync operations

use crate::error::StoreError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Outcome counters for one store's pulls and write cycles
///
/// Uses atomic counters for lock-free reads and writes of simple counters,
/// while the last failure message remains behind a Mutex.
#[derive(Debug, Default)]
pub struct SyncStatistics {
    pub pulls_applied: AtomicU64,
    pub pulls_unchanged: AtomicU64,
    pub pulls_not_found: AtomicU64,
    pub pulls_skipped: AtomicU64,
    pub pulls_discarded: AtomicU64,
    pub pulls_failed: AtomicU64,
    pub writes_synced: AtomicU64,
    pub writes_failed: AtomicU64,
    pub local_failures: AtomicU64,
    last_error: Mutex<Option<String>>,
}

/// Plain copy of the counters, for display and assertions
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub pulls_applied: u64,
    pub pulls_unchanged: u64,
    pub pulls_not_found: u64,
    pub pulls_skipped: u64,
    pub pulls_discarded: u64,
    pub pulls_failed: u64,
    pub writes_synced: u64,
    pub writes_failed: u64,
    pub local_failures: u64,
    pub last_error: Option<String>,
}

impl SyncStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed pull
    pub(crate) fn record_pull_failure(&self, err: &StoreError) {
        Self::bump(&self.pulls_failed);
        self.set_last_error(err);
    }

    /// Records an abandoned write cycle
    pub(crate) fn record_write_failure(&self, err: &StoreError) {
        Self::bump(&self.writes_failed);
        self.set_last_error(err);
    }

    /// Records a durable cache read or write failure
    pub(crate) fn record_local_failure(&self, err: &StoreError) {
        Self::bump(&self.local_failures);
        self.set_last_error(err);
    }

    fn set_last_error(&self, err: &StoreError) {
        if let Ok(mut guard) = self.last_error.lock() {
            *guard = Some(clean_error_message(&err.to_string()));
        }
    }

    /// Most recent recorded failure
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|guard| guard.clone())
    }

    /// Total recorded failures of any kind
    pub fn failure_count(&self) -> u64 {
        self.pulls_failed.load(Ordering::Relaxed)
            + self.writes_failed.load(Ordering::Relaxed)
            + self.local_failures.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pulls_applied: self.pulls_applied.load(Ordering::Relaxed),
            pulls_unchanged: self.pulls_unchanged.load(Ordering::Relaxed),
            pulls_not_found: self.pulls_not_found.load(Ordering::Relaxed),
            pulls_skipped: self.pulls_skipped.load(Ordering::Relaxed),
            pulls_discarded: self.pulls_discarded.load(Ordering::Relaxed),
            pulls_failed: self.pulls_failed.load(Ordering::Relaxed),
            writes_synced: self.writes_synced.load(Ordering::Relaxed),
            writes_failed: self.writes_failed.load(Ordering::Relaxed),
            local_failures: self.local_failures.load(Ordering::Relaxed),
            last_error: self.last_error(),
        }
    }
}

impl StatsSnapshot {
    /// Generates a one-line summary for the command line
    pub fn summary(&self, key: &str) -> String {
        let mut line = format!(
            "{key}: {} pulled, {} unchanged, {} not found, {} skipped, {} writes synced",
            self.pulls_applied,
            self.pulls_unchanged,
            self.pulls_not_found,
            self.pulls_skipped,
            self.writes_synced
        );
        let failures = self.pulls_failed + self.writes_failed + self.local_failures;
        if failures > 0 {
            line.push_str(&format!(", {failures} failed"));
            if let Some(err) = &self.last_error {
                line.push_str(&format!(" (last: {err})"));
            }
        }
        line
    }
}

const ERROR_MESSAGE_MAX_LENGTH: usize = 120;

/// Collapses multi-line error text to a single bounded line
pub(crate) fn clean_error_message(message: &str) -> String {
    let single_line = message.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= ERROR_MESSAGE_MAX_LENGTH {
        single_line
    } else {
        let truncated: String = single_line.chars().take(ERROR_MESSAGE_MAX_LENGTH - 3).collect();
        format!("{truncated}...")
    }
}
