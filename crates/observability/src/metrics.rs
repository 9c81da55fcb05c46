//! Record metrics collection
//!
//! Prometheus instrumentation for classified records plus an in-memory
//! aggregator for end-of-run summaries.

use std::collections::HashMap;

use contracts::{ClassifiedRecord, Outcome, TemplateKind};
use metrics::{counter, histogram};

/// Record metrics for one classified record
///
/// Call once per record produced by the classifier.
pub fn record_record_metrics(record: &ClassifiedRecord) {
    counter!(
        "ingest_records_total",
        "kind" => record.template_kind.prefix(),
        "outcome" => record.outcome.as_str()
    )
    .increment(1);

    if record.outcome == Outcome::Success {
        histogram!(
            "ingest_record_volume",
            "kind" => record.template_kind.prefix()
        )
        .record(record.volume);
    }

    if record.outcome == Outcome::UnresolvedGroup {
        counter!(
            "ingest_unresolved_groups_total",
            "label" => record.raw_group_label.clone()
        )
        .increment(1);
    }
}

/// Record statistics aggregator
///
/// Aggregates classified records in memory for summary output.
#[derive(Debug, Clone, Default)]
pub struct IngestStatsAggregator {
    /// Total records seen
    pub total_records: u64,

    /// Reports (periodic work summaries)
    pub reports: u64,

    /// Incident alerts
    pub alerts: u64,

    /// Records with a resolved area
    pub successes: u64,

    /// Records whose group label matched no area
    pub unresolved: u64,

    /// Records that failed extraction
    pub parse_errors: u64,

    /// Volume statistics over successful records
    pub volume_stats: RunningStats,

    /// Per-area volume statistics
    pub area_volumes: HashMap<String, RunningStats>,

    /// Occurrences of each unresolved group label
    pub unresolved_labels: HashMap<String, u64>,
}

impl IngestStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the aggregate
    pub fn update(&mut self, record: &ClassifiedRecord) {
        self.total_records += 1;
        match record.template_kind {
            TemplateKind::Report => self.reports += 1,
            TemplateKind::Alert => self.alerts += 1,
        }

        match record.outcome {
            Outcome::Success => {
                self.successes += 1;
                self.volume_stats.push(record.volume);
                if let Some(area) = &record.resolved_area {
                    self.area_volumes
                        .entry(area.clone())
                        .or_default()
                        .push(record.volume);
                }
            }
            Outcome::UnresolvedGroup => {
                self.unresolved += 1;
                *self
                    .unresolved_labels
                    .entry(record.raw_group_label.clone())
                    .or_insert(0) += 1;
            }
            Outcome::ParseError => self.parse_errors += 1,
        }
    }

    /// Produce a summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_records: self.total_records,
            reports: self.reports,
            alerts: self.alerts,
            successes: self.successes,
            unresolved: self.unresolved,
            parse_errors: self.parse_errors,
            unresolved_rate: if self.total_records > 0 {
                self.unresolved as f64 / self.total_records as f64 * 100.0
            } else {
                0.0
            },
            volume: StatsSummary::from(&self.volume_stats),
            area_volumes: self
                .area_volumes
                .iter()
                .map(|(area, stats)| (area.clone(), StatsSummary::from(stats)))
                .collect(),
            unresolved_labels: self.unresolved_labels.clone(),
        }
    }

    /// Reset all aggregates
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Summary of aggregated record statistics
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_records: u64,
    pub reports: u64,
    pub alerts: u64,
    pub successes: u64,
    pub unresolved: u64,
    pub parse_errors: u64,
    pub unresolved_rate: f64,
    pub volume: StatsSummary,
    pub area_volumes: HashMap<String, StatsSummary>,
    pub unresolved_labels: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Ingest Summary ===")?;
        writeln!(
            f,
            "Records: {} ({} reports, {} alerts)",
            self.total_records, self.reports, self.alerts
        )?;
        writeln!(f, "Successful: {}", self.successes)?;
        writeln!(
            f,
            "Unresolved groups: {} ({:.2}%)",
            self.unresolved, self.unresolved_rate
        )?;
        writeln!(f, "Parse errors: {}", self.parse_errors)?;
        writeln!(f, "Volume: {}", self.volume)?;

        if !self.area_volumes.is_empty() {
            writeln!(f, "Volume by area:")?;
            let mut areas: Vec<_> = self.area_volumes.iter().collect();
            areas.sort_by_key(|(area, _)| area.as_str());
            for (area, stats) in areas {
                writeln!(f, "  {}: {}", area, stats)?;
            }
        }

        if !self.unresolved_labels.is_empty() {
            writeln!(f, "Unresolved group labels:")?;
            let mut labels: Vec<_> = self.unresolved_labels.iter().collect();
            labels.sort_by_key(|(label, _)| label.as_str());
            for (label, count) in labels {
                writeln!(f, "  {}: {}", label, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::record_id;

    fn record(kind: TemplateKind, outcome: Outcome, area: Option<&str>, volume: f64) -> ClassifiedRecord {
        let now = Utc::now();
        ClassifiedRecord {
            record_id: record_id(kind, 1, now),
            template_kind: kind,
            sequence_id: 1,
            received_at: now,
            event_date: "10/01/2025".to_string(),
            report_type: "N/A".to_string(),
            raw_group_label: "grupo x".to_string(),
            resolved_area: area.map(str::to_string),
            responsible_party: "N/A".to_string(),
            volume,
            detail_text: None,
            full_body: String::new(),
            outcome,
            error: None,
            lifecycle_status: None,
            processed_at: now,
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        stats.push(1.0);
        stats.push(2.0);
        stats.push(3.0);
        stats.push(4.0);
        stats.push(5.0);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = IngestStatsAggregator::new();

        aggregator.update(&record(
            TemplateKind::Report,
            Outcome::Success,
            Some("MG"),
            2.0,
        ));
        aggregator.update(&record(
            TemplateKind::Alert,
            Outcome::UnresolvedGroup,
            None,
            1.0,
        ));
        aggregator.update(&record(TemplateKind::Alert, Outcome::ParseError, None, 1.0));

        assert_eq!(aggregator.total_records, 3);
        assert_eq!(aggregator.reports, 1);
        assert_eq!(aggregator.alerts, 2);
        assert_eq!(aggregator.successes, 1);
        assert_eq!(aggregator.unresolved, 1);
        assert_eq!(aggregator.parse_errors, 1);
        assert_eq!(aggregator.unresolved_labels.get("grupo x"), Some(&1));
        assert_eq!(aggregator.area_volumes.get("MG").unwrap().count(), 1);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = IngestStatsAggregator::new();
        aggregator.update(&record(
            TemplateKind::Report,
            Outcome::Success,
            Some("MG"),
            3.0,
        ));

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Records: 1 (1 reports, 0 alerts)"));
        assert!(output.contains("MG"));
    }
}
