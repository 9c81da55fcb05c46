//! MessageTransport trait - upstream feed abstraction
//!
//! Abstracts the chat-platform transport as "fetch the next batch of messages
//! since cursor X" plus a handful of session-management calls. Real transports
//! and test doubles implement the same interface.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ChannelId, RawMessage, TransportError};

/// Identity of the polling credential, as reported by the upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub display_name: String,
}

/// Membership role of an identity within a channel.
///
/// Privilege level can silently gate which messages the upstream makes
/// visible to the poller, so diagnostics report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Unknown,
}

impl MembershipRole {
    /// Parse the upstream's role string; anything unrecognized is `Unknown`.
    pub fn parse(role: &str) -> Self {
        match role {
            "creator" | "owner" => Self::Owner,
            "administrator" => Self::Administrator,
            "member" => Self::Member,
            "restricted" => Self::Restricted,
            "left" | "kicked" => Self::Left,
            _ => Self::Unknown,
        }
    }

    /// Whether the role carries elevated visibility.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Owner | Self::Administrator)
    }
}

/// Upstream message transport.
///
/// One active poller per credential: the upstream enforces single-active-poller
/// itself, which is why [`TransportError::DuplicateSession`] exists. The
/// conflict arrives asynchronously upstream; implementations surface it as the
/// error of the in-flight `next_batch` call.
pub trait MessageTransport: Send + Sync {
    /// Identity/handshake call. Success implies reachability.
    fn identify(&self) -> impl Future<Output = Result<Identity, TransportError>> + Send;

    /// Best-effort teardown of any stale session registration left by a prior
    /// instance (e.g. a webhook that blocks long-polling).
    fn clear_stale_session(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Fetch the next batch of messages after `cursor`.
    ///
    /// Long-polls up to `timeout`; an empty batch on timeout is normal.
    /// Returned messages carry monotonically increasing `sequence_id`s.
    fn next_batch(
        &self,
        cursor: u64,
        max_items: usize,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<RawMessage>, TransportError>> + Send;

    /// Membership role of `identity_id` within `channel`.
    fn membership_role(
        &self,
        channel: &ChannelId,
        identity_id: i64,
    ) -> impl Future<Output = Result<MembershipRole, TransportError>> + Send;

    /// Send a text message into `channel`.
    fn send_message(
        &self,
        channel: &ChannelId,
        text: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(MembershipRole::parse("creator"), MembershipRole::Owner);
        assert_eq!(
            MembershipRole::parse("administrator"),
            MembershipRole::Administrator
        );
        assert_eq!(MembershipRole::parse("member"), MembershipRole::Member);
        assert_eq!(MembershipRole::parse("banana"), MembershipRole::Unknown);
    }

    #[test]
    fn test_privilege() {
        assert!(MembershipRole::Owner.is_privileged());
        assert!(MembershipRole::Administrator.is_privileged());
        assert!(!MembershipRole::Member.is_privileged());
    }
}
