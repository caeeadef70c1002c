//! Per-provider completion counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic success/failure counters for one provider instance.
///
/// Shared across concurrent fan-out calls; increments are atomic so
/// concurrent completions never lose an update.
#[derive(Debug, Default)]
pub struct CompletionCounters {
    completed: AtomicU64,
    failed: AtomicU64,
}

impl CompletionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one successful completion.
    pub fn record_success(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one failed completion.
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of completions that succeeded.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Number of completions that failed.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}
