//! Session error types

use thiserror::Error;

use contracts::TransportError;

/// Session-manager errors
///
/// Per-message failures never show up here: they are absorbed at the per-item
/// boundary and surface as counters and record outcomes. Only conditions that
/// require operator action become `SessionError`s.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Startup handshake failed; session stays stopped
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Conflict-recovery budget exhausted; session stopped, manual restart required
    #[error("recovery budget exhausted after {attempts} attempts")]
    RecoveryExhausted { attempts: u32 },
}
