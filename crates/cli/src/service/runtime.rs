//! Service runtime: composes transport, store, and session manager.
//!
//! Exactly one session manager is constructed per process, which is how
//! single-instance polling is enforced on this side of the upstream.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use config_loader::{ServiceConfig, StoreKind};
use contracts::{ChannelId, MessageTransport, RecordStore};
use gateway::{JsonlStore, LogStore};
use ingestion::{ReplayTransport, SessionConfig, SessionManager, SessionState};

use crate::error::CliError;
use crate::service::stats::ServiceStats;

/// Options assembled from configuration plus CLI overrides.
pub struct ServiceOptions {
    pub config: ServiceConfig,
    /// Stop automatically once the replay log is fully consumed
    pub drain: bool,
}

/// The composed service.
pub struct ServiceRuntime {
    options: ServiceOptions,
}

impl ServiceRuntime {
    pub fn new(options: ServiceOptions) -> Self {
        Self { options }
    }

    /// Run the ingestion session until shutdown.
    ///
    /// Shutdown triggers: Ctrl+C / SIGTERM, terminal session stop (recovery
    /// budget spent), or replay drain when requested.
    pub async fn run(self) -> Result<ServiceStats, CliError> {
        let config = &self.options.config;

        let replay = config.replay.as_ref().ok_or_else(|| {
            CliError::no_transport(
                "the run command needs a [replay] section pointing at a captured message log",
            )
        })?;
        let transport = ReplayTransport::from_path(&PathBuf::from(&replay.path))
            .map_err(|e| CliError::session(e.to_string()))?;
        let drain_target = self.options.drain.then(|| transport.last_sequence_id());
        let transport = Arc::new(transport);

        let session_config = session_config_from(config);

        match config.store.kind {
            StoreKind::Log => {
                let store = Arc::new(LogStore::new("log"));
                run_session(transport, store, session_config, drain_target).await
            }
            StoreKind::Jsonl => {
                let store = Arc::new(
                    JsonlStore::new("jsonl", &config.store.path).map_err(CliError::Io)?,
                );
                let stats =
                    run_session(transport, store.clone(), session_config, drain_target).await?;
                let store_metrics = store.metrics().snapshot();
                info!(
                    appends = store_metrics.append_count,
                    duplicates = store_metrics.duplicate_count,
                    failures = store_metrics.failure_count,
                    "jsonl store totals"
                );
                Ok(stats)
            }
        }
    }
}

/// Map the configuration file onto the session manager's config.
fn session_config_from(config: &ServiceConfig) -> SessionConfig {
    let mut session = SessionConfig::new(ChannelId::new(&config.channel.id));
    session.max_items = config.polling.max_items;
    session.poll_timeout = Duration::from_secs(config.polling.timeout_secs);
    session.recovery.max_attempts = config.recovery.max_attempts;
    session.recovery.cooldown = Duration::from_secs(config.recovery.cooldown_secs);
    session.recovery.base_delay = Duration::from_secs(config.recovery.base_delay_secs);
    session
}

async fn run_session<T, S>(
    transport: Arc<T>,
    store: Arc<S>,
    session_config: SessionConfig,
    drain_target: Option<u64>,
) -> Result<ServiceStats, CliError>
where
    T: MessageTransport + 'static,
    S: RecordStore + Send + Sync + 'static,
{
    let manager = SessionManager::new(transport, store, session_config);
    let started = Instant::now();

    manager
        .start()
        .await
        .map_err(|e| CliError::session(e.to_string()))?;

    let diagnostics = manager.diagnostics().await;
    if let Some(identity) = &diagnostics.identity {
        info!(username = %identity.username, channel = %diagnostics.channel, "session healthy");
    }
    if diagnostics.privileged == Some(false) {
        warn!(
            channel = %diagnostics.channel,
            "identity is not an administrator of the target channel; some messages may be invisible"
        );
    }

    let shutdown = setup_shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                warn!("Received shutdown signal, stopping session");
                break;
            }
            _ = sleep(Duration::from_millis(200)) => {
                if manager.state() == SessionState::Stopped {
                    warn!("Session stopped on its own");
                    break;
                }
                if let Some(target) = drain_target {
                    if manager.counters().cursor >= target {
                        info!("Replay log drained, stopping session");
                        break;
                    }
                }
            }
        }
    }

    manager.stop().await;

    Ok(ServiceStats {
        duration: started.elapsed(),
        counters: manager.counters(),
    })
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
