//! Store metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single record store
#[derive(Debug, Default)]
pub struct StoreMetrics {
    /// Total successful appends
    append_count: AtomicU64,
    /// Total append failures
    failure_count: AtomicU64,
    /// Appends collapsed as duplicates of an already-stored record
    duplicate_count: AtomicU64,
}

impl StoreMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_count(&self) -> u64 {
        self.append_count.load(Ordering::Relaxed)
    }

    pub fn inc_append_count(&self) {
        self.append_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn duplicate_count(&self) -> u64 {
        self.duplicate_count.load(Ordering::Relaxed)
    }

    pub fn inc_duplicate_count(&self) {
        self.duplicate_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> StoreMetricsSnapshot {
        StoreMetricsSnapshot {
            append_count: self.append_count(),
            failure_count: self.failure_count(),
            duplicate_count: self.duplicate_count(),
        }
    }
}

/// Snapshot of store metrics (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct StoreMetricsSnapshot {
    pub append_count: u64,
    pub failure_count: u64,
    pub duplicate_count: u64,
}
