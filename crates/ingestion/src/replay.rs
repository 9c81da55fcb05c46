//! Replay transport - feed a session from a captured message log
//!
//! Loads a JSONL file of [`RawMessage`]s and serves them through the normal
//! transport interface. Useful for backfills and for demonstrating the full
//! pipeline without upstream credentials.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use tracing::info;

use contracts::{
    ChannelId, Identity, MembershipRole, MessageTransport, RawMessage, TransportError,
};

/// Transport that replays a fixed set of messages in sequence order.
#[derive(Debug)]
pub struct ReplayTransport {
    messages: Vec<RawMessage>,
}

impl ReplayTransport {
    /// Load messages from a JSONL file, one [`RawMessage`] per line.
    /// Blank lines are skipped. Messages are sorted by `sequence_id`.
    pub fn from_path(path: &Path) -> Result<Self, TransportError> {
        let file = File::open(path).map_err(|err| {
            TransportError::unreachable(format!("cannot open {}: {err}", path.display()))
        })?;

        let mut messages = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|err| {
                TransportError::decode(format!("read error at line {}: {err}", line_no + 1))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let message: RawMessage = serde_json::from_str(&line).map_err(|err| {
                TransportError::decode(format!("invalid record at line {}: {err}", line_no + 1))
            })?;
            messages.push(message);
        }
        messages.sort_by_key(|m| m.sequence_id);
        info!(count = messages.len(), path = %path.display(), "replay log loaded");

        Ok(Self { messages })
    }

    pub fn from_messages(mut messages: Vec<RawMessage>) -> Self {
        messages.sort_by_key(|m| m.sequence_id);
        Self { messages }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Highest sequence id in the log; 0 for an empty log.
    pub fn last_sequence_id(&self) -> u64 {
        self.messages.last().map(|m| m.sequence_id).unwrap_or(0)
    }
}

impl MessageTransport for ReplayTransport {
    async fn identify(&self) -> Result<Identity, TransportError> {
        Ok(Identity {
            id: 0,
            username: "replay".to_string(),
            display_name: "Replay transport".to_string(),
        })
    }

    async fn clear_stale_session(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_batch(
        &self,
        cursor: u64,
        max_items: usize,
        timeout: Duration,
    ) -> Result<Vec<RawMessage>, TransportError> {
        let batch: Vec<RawMessage> = self
            .messages
            .iter()
            .filter(|m| m.sequence_id > cursor)
            .take(max_items)
            .cloned()
            .collect();

        if batch.is_empty() {
            // Log exhausted. Pace like a quiet long-poll would.
            tokio::time::sleep(timeout.min(Duration::from_millis(200))).await;
        }
        Ok(batch)
    }

    async fn membership_role(
        &self,
        _channel: &ChannelId,
        _identity_id: i64,
    ) -> Result<MembershipRole, TransportError> {
        Ok(MembershipRole::Administrator)
    }

    async fn send_message(&self, channel: &ChannelId, text: &str) -> Result<(), TransportError> {
        info!(channel = %channel, text, "replay transport dropping outbound message");
        Ok(())
    }
}
