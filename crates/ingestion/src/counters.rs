//! Session counters for observability
//!
//! Single-writer discipline: only the poll loop and its recovery handler
//! mutate these; external callers read snapshots.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Mutable counters owned by one ingestion session.
#[derive(Debug, Default)]
pub struct SessionCounters {
    /// Items yielded by the poll loop
    received: AtomicU64,
    /// Records handed to the store successfully
    processed: AtomicU64,
    /// Items dropped as not relevant (foreign channel, empty, unrecognized title)
    skipped: AtomicU64,
    /// Per-item failures absorbed by the loop
    errors: AtomicU64,
    /// Duplicate-session conflict signals observed
    conflicts: AtomicU64,
    /// Consecutive recovery attempts since the last successful fetch
    recovery_attempts: AtomicU32,
    /// Highest upstream sequence id acknowledged; monotonic non-decreasing
    cursor: AtomicU64,
    /// Instant the session last started
    started_at: Mutex<Option<DateTime<Utc>>>,
    /// Last operator-relevant failure, if any
    last_error: Mutex<Option<String>>,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_conflicts(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_recovery_attempts(&self, attempts: u32) {
        self.recovery_attempts.store(attempts, Ordering::Relaxed);
    }

    pub fn recovery_attempts(&self) -> u32 {
        self.recovery_attempts.load(Ordering::Relaxed)
    }

    /// Advance the cursor; never moves backwards.
    pub fn advance_cursor(&self, sequence_id: u64) {
        self.cursor.fetch_max(sequence_id, Ordering::Relaxed);
    }

    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::Relaxed)
    }

    pub fn mark_started(&self) {
        *self.started_at.lock().unwrap_or_else(|e| e.into_inner()) = Some(Utc::now());
    }

    pub fn set_last_error(&self, error: impl Into<String>) {
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(error.into());
    }

    pub fn clear_last_error(&self) {
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Point-in-time snapshot for diagnostics and reporting.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            received: self.received.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            recovery_attempts: self.recovery_attempts(),
            cursor: self.cursor(),
            started_at: *self.started_at.lock().unwrap_or_else(|e| e.into_inner()),
            last_error: self
                .last_error
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        }
    }
}

/// Immutable snapshot of [`SessionCounters`].
#[derive(Debug, Clone, Serialize)]
pub struct CounterSnapshot {
    pub received: u64,
    pub processed: u64,
    pub skipped: u64,
    pub errors: u64,
    pub conflicts: u64,
    pub recovery_attempts: u32,
    pub cursor: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}
