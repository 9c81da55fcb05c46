//! Layered error definitions
//!
//! Categorized by source: transport / store / record. Per-message classification
//! outcomes are not errors, they live in [`crate::Outcome`].

use thiserror::Error;

/// Errors raised by the upstream message transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Transport cannot be reached at all. Fatal to session startup.
    #[error("transport unreachable: {message}")]
    Unreachable { message: String },

    /// Another active poller holds the same upstream credential.
    ///
    /// Recoverable through the session manager's bounded retry budget.
    #[error("duplicate session conflict: {message}")]
    DuplicateSession { message: String },

    /// Upstream API rejected or failed a call.
    #[error("transport api error: {message}")]
    Api {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Inbound payload could not be decoded.
    #[error("transport decode error: {message}")]
    Decode { message: String },
}

impl TransportError {
    /// Create an unreachable-transport error
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
        }
    }

    /// Create a duplicate-session conflict error
    pub fn duplicate_session(message: impl Into<String>) -> Self {
        Self::DuplicateSession {
            message: message.into(),
        }
    }

    /// Create a generic API error
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            source: None,
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Whether this error is the duplicate-session conflict signal
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateSession { .. })
    }
}

/// Errors raised by a record store (persistence gateway).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Append failed
    #[error("store '{store}' append error: {message}")]
    Append { store: String, message: String },

    /// Record could not be serialized
    #[error("store '{store}' serialize error: {message}")]
    Serialize { store: String, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Create an append error
    pub fn append(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Append {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Create a serialize error
    pub fn serialize(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialize {
            store: store.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by record mutation guards.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// Lifecycle status exists only on incident alerts
    #[error("record '{record_id}' is not an incident alert, lifecycle status is immutable")]
    NotAnAlert { record_id: String },
}
