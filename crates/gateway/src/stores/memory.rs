//! MemoryStore - in-memory store with failure injection, for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use contracts::{ClassifiedRecord, RecordStore, StoreError, TemplateKind};

use crate::metrics::StoreMetrics;

/// In-memory record store.
///
/// Collapses duplicates by content: appending a record whose content matches
/// an already-stored record of the same collection is a no-op. Supports
/// injected append failures so callers' error paths can be exercised.
pub struct MemoryStore {
    name: String,
    records: Mutex<HashMap<TemplateKind, Vec<ClassifiedRecord>>>,
    fail_appends: AtomicBool,
    metrics: StoreMetrics,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Mutex::new(HashMap::new()),
            fail_appends: AtomicBool::new(false),
            metrics: StoreMetrics::new(),
        }
    }

    /// Make subsequent appends fail until called with `false`.
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    /// Stored records of one collection, in append order.
    pub fn records(&self, kind: TemplateKind) -> Vec<ClassifiedRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn append(
        &self,
        kind: TemplateKind,
        record: &ClassifiedRecord,
    ) -> Result<(), StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            self.metrics.inc_failure_count();
            return Err(StoreError::append(&self.name, "injected append failure"));
        }

        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let collection = records.entry(kind).or_default();
        if collection.iter().any(|stored| stored.same_content(record)) {
            self.metrics.inc_duplicate_count();
            return Ok(());
        }
        collection.push(record.clone());
        self.metrics.inc_append_count();
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::{record_id, Outcome};

    fn record(sequence_id: u64) -> ClassifiedRecord {
        let now = Utc::now();
        ClassifiedRecord {
            record_id: record_id(TemplateKind::Alert, sequence_id, now),
            template_kind: TemplateKind::Alert,
            sequence_id,
            received_at: now,
            event_date: "10/01/2025".to_string(),
            report_type: "N/A".to_string(),
            raw_group_label: "Minas".to_string(),
            resolved_area: Some("MG".to_string()),
            responsible_party: "Ana".to_string(),
            volume: 3.0,
            detail_text: Some("detalhe".to_string()),
            full_body: "corpo".to_string(),
            outcome: Outcome::Success,
            error: None,
            lifecycle_status: Some(contracts::LifecycleStatus::New),
            processed_at: now,
        }
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let store = MemoryStore::new("mem");
        store.append(TemplateKind::Alert, &record(1)).await.unwrap();
        store.append(TemplateKind::Alert, &record(2)).await.unwrap();

        assert_eq!(store.records(TemplateKind::Alert).len(), 2);
        assert_eq!(store.records(TemplateKind::Report).len(), 0);
    }

    #[tokio::test]
    async fn test_same_content_collapsed() {
        let store = MemoryStore::new("mem");
        let original = record(1);
        store.append(TemplateKind::Alert, &original).await.unwrap();
        // fresh id, same content
        let mut reprocessed = original.clone();
        reprocessed.record_id = "alert_1_999".to_string();
        store
            .append(TemplateKind::Alert, &reprocessed)
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.metrics().snapshot().duplicate_count, 1);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new("mem");
        store.set_fail_appends(true);
        let err = store
            .append(TemplateKind::Alert, &record(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Append { .. }));

        store.set_fail_appends(false);
        store.append(TemplateKind::Alert, &record(1)).await.unwrap();
        assert_eq!(store.len(), 1);
    }
}
