//! RecordStore trait - persistence gateway interface
//!
//! Defines the abstract interface for record stores.

use crate::{ClassifiedRecord, StoreError, TemplateKind};

/// Record persistence trait
///
/// All store implementations must implement this trait.
///
/// Contract note: callers may append the same `sequence_id` more than once
/// (at-least-once delivery, reprocessing after restart). Implementations must
/// tolerate that; final de-duplication policy belongs to the store, not to the
/// ingestion core.
#[trait_variant::make(RecordStore: Send)]
pub trait LocalRecordStore {
    /// Store name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Append a classified record, keyed by template kind
    ///
    /// # Errors
    /// Returns append/serialize/io errors with store context
    async fn append(&self, kind: TemplateKind, record: &ClassifiedRecord)
        -> Result<(), StoreError>;

    /// Flush buffered writes (if any)
    async fn flush(&self) -> Result<(), StoreError>;
}
