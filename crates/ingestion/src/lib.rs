//! # Ingestion
//!
//! Owns the lifecycle of the upstream polling connection: startup, duplicate-
//! session conflict recovery, shutdown, and counters. One sequential poll loop
//! per session; per-item failures are absorbed so the loop never dies with the
//! process still up.

mod counters;
mod error;
mod mock;
mod replay;
mod session;

pub use counters::{CounterSnapshot, SessionCounters};
pub use error::SessionError;
pub use mock::{ScriptStep, ScriptedTransport};
pub use replay::ReplayTransport;
pub use session::{
    Diagnostics, RecoveryPolicy, SessionConfig, SessionManager, SessionState,
};
