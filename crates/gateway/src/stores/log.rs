//! LogStore - logs record summaries via tracing

use contracts::{ClassifiedRecord, RecordStore, StoreError, TemplateKind};
use tracing::{info, instrument};

/// Store that logs record summaries instead of persisting them.
///
/// Useful for dry runs: the full pipeline executes, nothing is written.
pub struct LogStore {
    name: String,
}

impl LogStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_record_summary(&self, kind: TemplateKind, record: &ClassifiedRecord) {
        info!(
            store = %self.name,
            record_id = %record.record_id,
            collection = kind.collection(),
            event_date = %record.event_date,
            area = record.resolved_area.as_deref().unwrap_or("-"),
            volume = record.volume,
            outcome = record.outcome.as_str(),
            "classified record"
        );
    }
}

impl RecordStore for LogStore {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_store_append",
        skip(self, record),
        fields(store = %self.name, record_id = %record.record_id)
    )]
    async fn append(
        &self,
        kind: TemplateKind,
        record: &ClassifiedRecord,
    ) -> Result<(), StoreError> {
        self.log_record_summary(kind, record);
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        // Nothing buffered
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::{record_id, Outcome};

    fn record() -> ClassifiedRecord {
        let now = Utc::now();
        ClassifiedRecord {
            record_id: record_id(TemplateKind::Report, 1, now),
            template_kind: TemplateKind::Report,
            sequence_id: 1,
            received_at: now,
            event_date: "05/03/2024".to_string(),
            report_type: "Preventiva".to_string(),
            raw_group_label: "MG".to_string(),
            resolved_area: Some("MG".to_string()),
            responsible_party: "Carlos".to_string(),
            volume: 2.0,
            detail_text: None,
            full_body: "COP REDE INFORMA".to_string(),
            outcome: Outcome::Success,
            error: None,
            lifecycle_status: None,
            processed_at: now,
        }
    }

    #[tokio::test]
    async fn test_log_store_append() {
        let store = LogStore::new("test_log");
        assert_eq!(store.name(), "test_log");
        store
            .append(TemplateKind::Report, &record())
            .await
            .unwrap();
        store.flush().await.unwrap();
    }
}
