//! # Gateway
//!
//! Persistence gateway: [`contracts::RecordStore`] implementations that the
//! ingestion loop appends classified records to. Three stores ship here:
//!
//! - [`LogStore`]: structured-log only, for dry runs and troubleshooting
//! - [`JsonlStore`]: append-only JSONL files, one per record collection
//! - [`MemoryStore`]: in-memory, with failure injection, for tests
//!
//! All stores tolerate repeated appends of the same upstream message;
//! delivery is at-least-once and duplicate collapsing happens here.

mod metrics;
mod stores;

pub use metrics::{StoreMetrics, StoreMetricsSnapshot};
pub use stores::{JsonlStore, LogStore, MemoryStore};
