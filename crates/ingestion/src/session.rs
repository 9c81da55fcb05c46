//! Session manager - polling connection lifecycle
//!
//! One `SessionManager` owns one polling connection to the upstream. The
//! manager drives the state machine Stopped -> Starting -> Running, with a
//! Recovering detour when the upstream reports a duplicate-session conflict.
//! Recovery is bounded: a cooldown spaces attempts apart, a linear backoff
//! grows with the attempt number, and once the budget is spent the session
//! stops and stays stopped until an operator restarts it.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info, instrument, warn};

use classifier::classify;
use contracts::{ChannelId, Identity, RawMessage, RecordStore};
use contracts::{MessageTransport, TransportError};

use crate::counters::{CounterSnapshot, SessionCounters};
use crate::error::SessionError;

/// How long `stop()` waits for the poll loop to finish its in-flight work
/// before detaching it.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Conflict recovery tuning.
#[derive(Debug, Clone)]
pub struct RecoveryPolicy {
    /// Consecutive conflict recoveries allowed before the session gives up.
    pub max_attempts: u32,
    /// Minimum spacing between two recovery attempts.
    pub cooldown: Duration,
    /// Backoff unit; attempt N sleeps `base_delay * N`.
    pub base_delay: Duration,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            cooldown: Duration::from_secs(30),
            base_delay: Duration::from_secs(5),
        }
    }
}

/// Static configuration of one polling session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Channel the session listens to; messages from other channels are skipped.
    pub channel: ChannelId,
    /// Maximum number of messages fetched per poll.
    pub max_items: usize,
    /// Long-poll timeout handed to the transport.
    pub poll_timeout: Duration,
    pub recovery: RecoveryPolicy,
}

impl SessionConfig {
    pub fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            max_items: 100,
            poll_timeout: Duration::from_secs(30),
            recovery: RecoveryPolicy::default(),
        }
    }
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Stopped,
    Starting,
    Running,
    Recovering,
}

/// Atomic cell holding a [`SessionState`].
#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new(state: SessionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    fn set(&self, state: SessionState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    fn get(&self) -> SessionState {
        match self.0.load(Ordering::SeqCst) {
            1 => SessionState::Starting,
            2 => SessionState::Running,
            3 => SessionState::Recovering,
            _ => SessionState::Stopped,
        }
    }
}

/// Operator-facing snapshot of one session.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub state: SessionState,
    pub channel: ChannelId,
    /// Whether the handshake probe succeeded
    pub connected: bool,
    pub identity: Option<Identity>,
    /// Whether the identity holds an administrator or owner role in the
    /// channel. `None` when the probe could not determine it.
    pub privileged: Option<bool>,
    pub counters: CounterSnapshot,
}

struct Inner {
    loop_handle: Option<JoinHandle<()>>,
    stop_tx: Option<watch::Sender<bool>>,
}

/// Lifecycle owner of one upstream polling connection.
///
/// Single-instance enforcement is by construction: the process composes
/// exactly one manager per credential and shares it behind an `Arc`.
pub struct SessionManager<T, S> {
    transport: Arc<T>,
    store: Arc<S>,
    config: SessionConfig,
    counters: Arc<SessionCounters>,
    state: Arc<StateCell>,
    identity: std::sync::Mutex<Option<Identity>>,
    inner: Mutex<Inner>,
}

impl<T, S> SessionManager<T, S>
where
    T: MessageTransport + 'static,
    S: RecordStore + Send + Sync + 'static,
{
    pub fn new(transport: Arc<T>, store: Arc<S>, config: SessionConfig) -> Self {
        Self {
            transport,
            store,
            config,
            counters: Arc::new(SessionCounters::new()),
            state: Arc::new(StateCell::new(SessionState::Stopped)),
            identity: std::sync::Mutex::new(None),
            inner: Mutex::new(Inner {
                loop_handle: None,
                stop_tx: None,
            }),
        }
    }

    /// Start the polling session.
    ///
    /// No-op if a session is already active. The startup handshake runs
    /// inline: a failed handshake leaves the session stopped and returns
    /// the transport error.
    #[instrument(name = "session_start", skip(self), fields(channel = %self.config.channel))]
    pub async fn start(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        match &inner.loop_handle {
            Some(handle) if !handle.is_finished() => {
                warn!("start requested but session is already active");
                return Ok(());
            }
            // A finished handle means the loop died on its own (recovery
            // budget spent); a fresh start is allowed.
            _ => {
                inner.loop_handle = None;
                inner.stop_tx = None;
            }
        }

        self.state.set(SessionState::Starting);

        // Best effort: a leftover registration from a prior instance would
        // otherwise block long-polling until it expires.
        if let Err(err) = self.transport.clear_stale_session().await {
            warn!(error = %err, "failed to clear stale session registration");
        }

        let identity = match self.transport.identify().await {
            Ok(identity) => identity,
            Err(err) => {
                self.state.set(SessionState::Stopped);
                self.counters.set_last_error(err.to_string());
                return Err(err.into());
            }
        };
        info!(username = %identity.username, "transport handshake complete");
        *self
            .identity
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(identity);

        self.counters.mark_started();
        self.counters.clear_last_error();
        self.counters.set_recovery_attempts(0);

        let (stop_tx, stop_rx) = watch::channel(false);
        let poll_loop = PollLoop {
            transport: self.transport.clone(),
            store: self.store.clone(),
            config: self.config.clone(),
            counters: self.counters.clone(),
            state: self.state.clone(),
            stop_rx,
        };
        inner.loop_handle = Some(tokio::spawn(poll_loop.run()));
        inner.stop_tx = Some(stop_tx);

        info!("session started");
        Ok(())
    }

    /// Stop the polling session.
    ///
    /// Signals the poll loop, waits up to a grace period for it to finish the
    /// in-flight batch, then detaches it. No-op if nothing is running.
    #[instrument(name = "session_stop", skip(self), fields(channel = %self.config.channel))]
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        let Some(mut handle) = inner.loop_handle.take() else {
            debug!("stop requested but session is not active");
            return;
        };
        if let Some(stop_tx) = inner.stop_tx.take() {
            let _ = stop_tx.send(true);
        }

        if timeout(STOP_GRACE, &mut handle).await.is_err() {
            // The stop flag is already set; the loop exits at its next
            // control check while the in-flight long-poll finishes in the
            // background.
            warn!("poll loop still draining, detaching");
            drop(handle);
        }

        self.counters.set_recovery_attempts(0);
        // Leave nothing registered upstream for the next poller to trip over.
        if let Err(err) = self.transport.clear_stale_session().await {
            warn!(error = %err, "failed to clear session registration on stop");
        }

        self.state.set(SessionState::Stopped);
        info!("session stopped");
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Live health probe: handshake, membership role, state, counters.
    ///
    /// Read-only against the transport; safe to call while the loop runs.
    pub async fn diagnostics(&self) -> Diagnostics {
        let identity = match self.transport.identify().await {
            Ok(identity) => {
                *self
                    .identity
                    .lock()
                    .unwrap_or_else(|e| e.into_inner()) = Some(identity.clone());
                Some(identity)
            }
            Err(err) => {
                warn!(error = %err, "diagnostics handshake failed");
                None
            }
        };
        let privileged = match &identity {
            Some(identity) => self
                .transport
                .membership_role(&self.config.channel, identity.id)
                .await
                .ok()
                .map(|role| role.is_privileged()),
            None => None,
        };
        Diagnostics {
            state: self.state.get(),
            channel: self.config.channel.clone(),
            connected: identity.is_some(),
            identity,
            privileged,
            counters: self.counters.snapshot(),
        }
    }
}

/// Outcome of one recovery attempt.
enum Recovery {
    Retry,
    GiveUp,
    Interrupted,
}

/// The sequential poll loop. Owned by its spawned task.
struct PollLoop<T, S> {
    transport: Arc<T>,
    store: Arc<S>,
    config: SessionConfig,
    counters: Arc<SessionCounters>,
    state: Arc<StateCell>,
    stop_rx: watch::Receiver<bool>,
}

impl<T, S> PollLoop<T, S>
where
    T: MessageTransport + 'static,
    S: RecordStore + Send + Sync + 'static,
{
    async fn run(mut self) {
        let mut last_recovery: Option<Instant> = None;

        loop {
            let fetch = self.transport.next_batch(
                self.counters.cursor(),
                self.config.max_items,
                self.config.poll_timeout,
            );

            let result = tokio::select! {
                _ = self.stop_rx.changed() => break,
                result = fetch => result,
            };

            match result {
                Ok(batch) => {
                    // First successful fetch after start or recovery settles
                    // the session back into Running and refunds the budget.
                    if self.state.get() != SessionState::Running {
                        self.state.set(SessionState::Running);
                        self.counters.set_recovery_attempts(0);
                    }
                    for message in batch {
                        self.handle_item(message).await;
                    }
                }
                Err(err) if err.is_conflict() => {
                    self.counters.inc_conflicts();
                    metrics::counter!("ingest_session_conflicts").increment(1);
                    match self.recover(&mut last_recovery).await {
                        Recovery::Retry => {}
                        Recovery::GiveUp | Recovery::Interrupted => break,
                    }
                }
                Err(err) => {
                    self.on_transient_error(&err).await;
                }
            }
        }

        self.state.set(SessionState::Stopped);
        if let Err(err) = self.store.flush().await {
            warn!(error = %err, "store flush on shutdown failed");
        }
        debug!("poll loop exited");
    }

    /// Transient (non-conflict) transport failure: log, count, pause briefly
    /// so a hard-down upstream does not spin the loop.
    async fn on_transient_error(&mut self, err: &TransportError) {
        warn!(error = %err, "poll failed, retrying");
        self.counters.inc_errors();
        self.counters.set_last_error(err.to_string());
        metrics::counter!("ingest_poll_errors").increment(1);
        tokio::select! {
            _ = self.stop_rx.changed() => {}
            _ = sleep(self.config.recovery.base_delay) => {}
        }
    }

    /// One bounded conflict-recovery attempt.
    ///
    /// Enforces the cooldown as minimum spacing since the previous attempt,
    /// sleeps the linear backoff, then clears any stale upstream session so
    /// the retried poll has a chance. The attempt counter only resets on a
    /// successful fetch, so a conflict storm cannot dodge the budget.
    async fn recover(&mut self, last_recovery: &mut Option<Instant>) -> Recovery {
        let policy = &self.config.recovery;
        let attempt = self.counters.recovery_attempts() + 1;
        if attempt > policy.max_attempts {
            error!(
                attempts = policy.max_attempts,
                "recovery budget exhausted, stopping session"
            );
            self.counters
                .set_last_error(SessionError::RecoveryExhausted {
                    attempts: policy.max_attempts,
                }
                .to_string());
            return Recovery::GiveUp;
        }
        self.counters.set_recovery_attempts(attempt);
        self.state.set(SessionState::Recovering);

        let mut wait = policy.base_delay * attempt;
        if let Some(previous) = *last_recovery {
            let since = previous.elapsed();
            if since < policy.cooldown {
                wait = wait.max(policy.cooldown - since);
            }
        }
        info!(
            attempt,
            max_attempts = policy.max_attempts,
            wait_ms = wait.as_millis() as u64,
            "duplicate session conflict, recovering"
        );

        let interrupted = tokio::select! {
            _ = self.stop_rx.changed() => true,
            _ = sleep(wait) => false,
        };
        *last_recovery = Some(Instant::now());
        if interrupted {
            return Recovery::Interrupted;
        }

        if let Err(err) = self.transport.clear_stale_session().await {
            warn!(error = %err, "clear_stale_session during recovery failed");
        }
        Recovery::Retry
    }

    /// Process one fetched message. Never returns an error: per-item failures
    /// are absorbed into counters so the loop keeps going.
    async fn handle_item(&self, message: RawMessage) {
        self.counters.inc_received();
        self.counters.advance_cursor(message.sequence_id);
        metrics::counter!("ingest_messages_received").increment(1);

        if !self.config.channel.matches_raw(&message.chat_id) {
            debug!(chat_id = %message.chat_id, "message from foreign channel, skipping");
            self.counters.inc_skipped();
            return;
        }

        let Some(record) = classify(&message) else {
            self.counters.inc_skipped();
            metrics::counter!("ingest_messages_skipped").increment(1);
            return;
        };

        let kind = record.template_kind;
        match self.store.append(kind, &record).await {
            Ok(()) => {
                self.counters.inc_processed();
                metrics::counter!(
                    "ingest_records_stored",
                    "kind" => kind.prefix(),
                    "outcome" => record.outcome.as_str(),
                )
                .increment(1);
                debug!(
                    record_id = %record.record_id,
                    outcome = ?record.outcome,
                    "record stored"
                );
            }
            Err(err) => {
                warn!(
                    sequence_id = message.sequence_id,
                    error = %err,
                    "store append failed, message dropped"
                );
                self.counters.inc_errors();
                self.counters.set_last_error(err.to_string());
                metrics::counter!("ingest_store_errors").increment(1);
            }
        }
    }
}
