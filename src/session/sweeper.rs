use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error};

use super::storage::ExpiringStore;
use crate::config::{ChatConfig, DEFAULT_CLEANUP_INTERVAL_MS, DEFAULT_SESSION_TIMEOUT_MS};

/// Periodically evicts idle sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirySweeper {
    period: Duration,
    idle_timeout: Duration,
}

impl ExpirySweeper {
    /// A zero period is bumped to one millisecond.
    pub fn new(period: Duration, idle_timeout: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            idle_timeout,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(
            Duration::from_millis(config.cleanup_interval_ms),
            Duration::from_millis(config.session_timeout_ms),
        )
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Run a single sweep. A panic inside the store is logged and counted as
    /// zero removals.
    pub fn run_once<S: ExpiringStore + ?Sized>(&self, store: &S) -> usize {
        match panic::catch_unwind(AssertUnwindSafe(|| store.sweep_expired(self.idle_timeout))) {
            Ok(removed) => {
                debug!(removed, "Session sweep finished");
                removed
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(error = %message, "Session sweep failed");
                0
            }
        }
    }

    /// Sweep every `period`, first sweep one period from now. Must be called
    /// inside a tokio runtime. Dropping the returned handle also stops the loop.
    pub fn spawn<S: ExpiringStore + 'static>(self, store: Arc<S>) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let join = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + self.period, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        self.run_once(store.as_ref());
                    }
                }
            }
            debug!("Session sweeper stopped");
        });

        SweeperHandle {
            shutdown: Some(shutdown_tx),
            join,
        }
    }
}

impl Default for ExpirySweeper {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_CLEANUP_INTERVAL_MS),
            Duration::from_millis(DEFAULT_SESSION_TIMEOUT_MS),
        )
    }
}

pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.join).await {
            error!(error = %e, "Session sweeper task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
