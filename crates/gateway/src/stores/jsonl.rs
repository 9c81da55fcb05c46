//! JsonlStore - append-only JSONL files, one per record collection

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{debug, instrument};

use contracts::{ClassifiedRecord, RecordStore, StoreError, TemplateKind};

use crate::metrics::StoreMetrics;

/// Store that appends records as JSON lines under a base directory.
///
/// Layout: `<base>/reports.jsonl` and `<base>/alerts.jsonl`. Files are
/// opened lazily in append mode, so restarts extend the existing log.
///
/// Duplicate collapsing: repeated appends of the same upstream message
/// (same collection, same `sequence_id`) within one process are skipped.
/// Duplicates across restarts survive in the file; readers de-duplicate
/// on `sequence_id` if they care.
pub struct JsonlStore {
    name: String,
    base_path: PathBuf,
    inner: Mutex<Inner>,
    metrics: StoreMetrics,
}

struct Inner {
    writers: HashMap<TemplateKind, BufWriter<File>>,
    seen: HashMap<TemplateKind, HashSet<u64>>,
}

impl JsonlStore {
    /// Create the store, creating `base_path` if needed.
    pub fn new(name: impl Into<String>, base_path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            name: name.into(),
            base_path,
            inner: Mutex::new(Inner {
                writers: HashMap::new(),
                seen: HashMap::new(),
            }),
            metrics: StoreMetrics::new(),
        })
    }

    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    /// Path of the file backing one collection.
    pub fn collection_path(&self, kind: TemplateKind) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", kind.collection()))
    }

    fn open_writer(&self, kind: TemplateKind) -> std::io::Result<BufWriter<File>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.collection_path(kind))?;
        Ok(BufWriter::new(file))
    }
}

impl RecordStore for JsonlStore {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "jsonl_store_append",
        skip(self, record),
        fields(store = %self.name, record_id = %record.record_id)
    )]
    async fn append(
        &self,
        kind: TemplateKind,
        record: &ClassifiedRecord,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;

        if !inner.seen.entry(kind).or_default().insert(record.sequence_id) {
            debug!(
                store = %self.name,
                sequence_id = record.sequence_id,
                "duplicate append collapsed"
            );
            self.metrics.inc_duplicate_count();
            return Ok(());
        }

        let line = serde_json::to_string(record).map_err(|err| {
            self.metrics.inc_failure_count();
            StoreError::serialize(&self.name, err.to_string())
        })?;

        if !inner.writers.contains_key(&kind) {
            let writer = self.open_writer(kind).map_err(|err| {
                self.metrics.inc_failure_count();
                StoreError::append(&self.name, err.to_string())
            })?;
            inner.writers.insert(kind, writer);
        }
        let writer = inner
            .writers
            .get_mut(&kind)
            .ok_or_else(|| StoreError::append(&self.name, "writer missing after open"))?;

        writeln!(writer, "{line}").map_err(|err| {
            self.metrics.inc_failure_count();
            StoreError::append(&self.name, err.to_string())
        })?;
        self.metrics.inc_append_count();
        metrics::counter!("gateway_appends", "store" => "jsonl").increment(1);
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        for writer in inner.writers.values_mut() {
            writer
                .flush()
                .map_err(|err| StoreError::append(&self.name, err.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::{record_id, Outcome};
    use tempfile::tempdir;

    fn record(kind: TemplateKind, sequence_id: u64) -> ClassifiedRecord {
        let now = Utc::now();
        ClassifiedRecord {
            record_id: record_id(kind, sequence_id, now),
            template_kind: kind,
            sequence_id,
            received_at: now,
            event_date: "10/01/2025".to_string(),
            report_type: "N/A".to_string(),
            raw_group_label: "Minas".to_string(),
            resolved_area: Some("MG".to_string()),
            responsible_party: "Ana".to_string(),
            volume: 3.0,
            detail_text: None,
            full_body: "corpo".to_string(),
            outcome: Outcome::Success,
            error: None,
            lifecycle_status: None,
            processed_at: now,
        }
    }

    #[tokio::test]
    async fn test_records_split_by_collection() {
        let dir = tempdir().unwrap();
        let store = JsonlStore::new("test_jsonl", dir.path()).unwrap();

        store
            .append(TemplateKind::Report, &record(TemplateKind::Report, 1))
            .await
            .unwrap();
        store
            .append(TemplateKind::Alert, &record(TemplateKind::Alert, 2))
            .await
            .unwrap();
        store.flush().await.unwrap();

        let reports = fs::read_to_string(dir.path().join("reports.jsonl")).unwrap();
        let alerts = fs::read_to_string(dir.path().join("alerts.jsonl")).unwrap();
        assert_eq!(reports.lines().count(), 1);
        assert_eq!(alerts.lines().count(), 1);

        let parsed: ClassifiedRecord = serde_json::from_str(reports.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.sequence_id, 1);
    }

    #[tokio::test]
    async fn test_duplicate_append_is_collapsed() {
        let dir = tempdir().unwrap();
        let store = JsonlStore::new("test_jsonl", dir.path()).unwrap();

        let first = record(TemplateKind::Report, 7);
        // reprocessing produces a different record_id for the same message
        let second = record(TemplateKind::Report, 7);
        store.append(TemplateKind::Report, &first).await.unwrap();
        store.append(TemplateKind::Report, &second).await.unwrap();
        store.flush().await.unwrap();

        let reports = fs::read_to_string(dir.path().join("reports.jsonl")).unwrap();
        assert_eq!(reports.lines().count(), 1);
        assert_eq!(store.metrics().snapshot().duplicate_count, 1);
        assert_eq!(store.metrics().snapshot().append_count, 1);
    }

    #[tokio::test]
    async fn test_append_mode_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = JsonlStore::new("test_jsonl", dir.path()).unwrap();
            store
                .append(TemplateKind::Report, &record(TemplateKind::Report, 1))
                .await
                .unwrap();
            store.flush().await.unwrap();
        }
        {
            let store = JsonlStore::new("test_jsonl", dir.path()).unwrap();
            store
                .append(TemplateKind::Report, &record(TemplateKind::Report, 2))
                .await
                .unwrap();
            store.flush().await.unwrap();
        }

        let reports = fs::read_to_string(dir.path().join("reports.jsonl")).unwrap();
        assert_eq!(reports.lines().count(), 2);
    }
}
