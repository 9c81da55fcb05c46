//! Core record types
//!
//! `RawMessage` is the externally owned inbound item; `ClassifiedRecord` is the
//! system's output entity. Template kinds and outcomes are closed enums: the
//! system understands exactly two message shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RecordError;

/// Title line identifying an operational report (TYPE_A).
pub const REPORT_TITLE: &str = "COP REDE INFORMA";

/// Title line identifying an incident alert (TYPE_B).
pub const ALERT_TITLE: &str = "🚨 Novo Evento Detectado!";

/// Sentinel for textual fields that are absent. Never an empty string, so that
/// downstream filtering stays well-defined.
pub const NOT_AVAILABLE: &str = "N/A";

/// Sentinel detail text for alerts whose body carries nothing beyond the fields.
pub const NO_DETAILS: &str = "no additional details";

/// Default volume when the field is absent or unparseable.
pub const DEFAULT_VOLUME: f64 = 1.0;

/// The two fixed message shapes this system understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Operational report (TYPE_A)
    Report,
    /// Incident alert (TYPE_B)
    Alert,
}

impl TemplateKind {
    /// Title line that identifies this template
    pub fn title(self) -> &'static str {
        match self {
            Self::Report => REPORT_TITLE,
            Self::Alert => ALERT_TITLE,
        }
    }

    /// Record id prefix
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Alert => "alert",
        }
    }

    /// Collection name used by stores
    pub fn collection(self) -> &'static str {
        match self {
            Self::Report => "reports",
            Self::Alert => "alerts",
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Processing outcome recorded on every classified record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Fields extracted and group label resolved
    Success,
    /// Message parsed but the group label matched no known area
    UnresolvedGroup,
    /// Extraction failed; record carries the captured error and the raw body
    ParseError,
}

impl Outcome {
    /// Static label for logging/metrics
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::UnresolvedGroup => "unresolved_group",
            Self::ParseError => "parse_error",
        }
    }
}

/// Mutable review state of an incident alert.
///
/// Settable only through [`ClassifiedRecord::set_lifecycle_status`]; the
/// ingestion path never touches it after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    New,
    UnderReview,
    Resolved,
}

/// Inbound message as delivered by the upstream transport. Read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    /// Transport-assigned monotonic position marker
    pub sequence_id: u64,
    /// Raw chat identifier, possibly in any of the transport's equivalent encodings
    pub chat_id: String,
    /// Whether the sender is an automated account
    pub sender_is_automated: bool,
    /// Message body text
    pub body: String,
    /// Delivery instant
    pub timestamp: DateTime<Utc>,
}

/// Structured record produced by classification.
///
/// `template_kind` and the provenance fields are immutable after creation;
/// only `lifecycle_status` (alerts) is ever mutated post-creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    /// Globally unique id: `{prefix}_{sequence_id}_{epoch_millis}`.
    /// Unique per processed message even when the same `sequence_id` is
    /// reprocessed after a restart.
    pub record_id: String,
    pub template_kind: TemplateKind,
    pub sequence_id: u64,
    pub received_at: DateTime<Utc>,
    /// Normalized `DD/MM/YYYY` calendar date
    pub event_date: String,
    /// Free-text report type (`TIPO` field), `N/A` when absent
    pub report_type: String,
    /// Untouched group label as found in the message, `N/A` when absent
    pub raw_group_label: String,
    /// Canonical dashboard area code, `None` when unresolved
    pub resolved_area: Option<String>,
    pub responsible_party: String,
    pub volume: f64,
    /// Alerts only; reports carry `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_text: Option<String>,
    /// Verbatim message body, retained for manual recovery
    pub full_body: String,
    pub outcome: Outcome,
    /// Captured error description when `outcome == ParseError`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Alerts only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle_status: Option<LifecycleStatus>,
    pub processed_at: DateTime<Utc>,
}

impl ClassifiedRecord {
    /// Update the review state of an incident alert.
    ///
    /// The only sanctioned post-creation mutation. Reports reject it.
    pub fn set_lifecycle_status(&mut self, status: LifecycleStatus) -> Result<(), RecordError> {
        if self.template_kind != TemplateKind::Alert {
            return Err(RecordError::NotAnAlert {
                record_id: self.record_id.clone(),
            });
        }
        self.lifecycle_status = Some(status);
        Ok(())
    }

    /// Semantic equality: all fields except `record_id` and `processed_at`.
    ///
    /// Two classifications of the same raw message compare equal here; the
    /// store, not the classifier, collapses such duplicates.
    pub fn same_content(&self, other: &Self) -> bool {
        self.template_kind == other.template_kind
            && self.sequence_id == other.sequence_id
            && self.received_at == other.received_at
            && self.event_date == other.event_date
            && self.report_type == other.report_type
            && self.raw_group_label == other.raw_group_label
            && self.resolved_area == other.resolved_area
            && self.responsible_party == other.responsible_party
            && self.volume == other.volume
            && self.detail_text == other.detail_text
            && self.full_body == other.full_body
            && self.outcome == other.outcome
            && self.error == other.error
            && self.lifecycle_status == other.lifecycle_status
    }
}

/// Build a record id from the identifying triple.
pub fn record_id(kind: TemplateKind, sequence_id: u64, created_at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        kind.prefix(),
        sequence_id,
        created_at.timestamp_millis()
    )
}
