//! Background worker for continuous Janitor operation

use crate::{CancellationToken, Janitor, JanitorConfig, JanitorError, JanitorMetrics, SweepReport};
use solvr_domain::traits::{NotificationSink, StaleContentStore};
use solvr_store::SqliteStore;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// A store the worker can sweep from a blocking thread
///
/// The same value is both the stale-content store and the notification
/// emitter. `interrupt` aborts whatever statement is in flight when the
/// worker shuts down.
pub trait SweepTarget: StaleContentStore + NotificationSink + Send + Sync + 'static {
    /// Abort the in-flight statement, if any
    fn interrupt(&self) {}
}

impl SweepTarget for SqliteStore {
    fn interrupt(&self) {
        SqliteStore::interrupt(self);
    }
}

/// Background worker that runs Janitor on a schedule
///
/// The first sweep runs as soon as the worker starts, then one per interval.
/// Sweeps run on tokio's blocking pool since store calls are synchronous.
///
/// # Examples
///
/// ```no_run
/// use solvr_janitor::{JanitorConfig, JanitorWorker};
/// use solvr_store::SqliteStore;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = Arc::new(SqliteStore::new("solvr.db")?);
///     let worker = JanitorWorker::new(JanitorConfig::default());
///
///     // Run indefinitely (until Ctrl+C)
///     worker.run(store).await?;
///     Ok(())
/// }
/// ```
pub struct JanitorWorker {
    janitor: Arc<Mutex<Janitor>>,
    interval: Duration,
    cancel: CancellationToken,
}

impl JanitorWorker {
    /// Create a new background worker with the given configuration
    pub fn new(config: JanitorConfig) -> Self {
        let interval = config.sweep_interval();
        let janitor = Janitor::new(config);
        let cancel = janitor.cancellation_token();
        Self {
            janitor: Arc::new(Mutex::new(janitor)),
            interval,
            cancel,
        }
    }

    /// Create a worker with default configuration
    pub fn default_config() -> Self {
        Self::new(JanitorConfig::default())
    }

    /// Override the sweep interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sweep interval in use
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Token that stops the current sweep between approaches
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn janitor(&self) -> MutexGuard<'_, Janitor> {
        self.janitor.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run one sweep on the blocking pool
    pub async fn sweep_once<S>(&self, store: &Arc<S>) -> Result<SweepReport, JanitorError>
    where
        S: SweepTarget,
        <S as StaleContentStore>::Error: Display,
        <S as NotificationSink>::Error: Display,
    {
        let store = Arc::clone(store);
        let janitor = Arc::clone(&self.janitor);

        tokio::task::spawn_blocking(move || {
            let mut janitor = janitor.lock().unwrap_or_else(|e| e.into_inner());
            janitor.sweep(&*store, &*store)
        })
        .await
        .map_err(|e| JanitorError::Worker(format!("Task join error: {}", e)))
    }

    /// Run the worker until Ctrl+C
    ///
    /// # Errors
    ///
    /// Returns an error if a sweep task could not be joined.
    pub async fn run<S>(&self, store: Arc<S>) -> Result<(), JanitorError>
    where
        S: SweepTarget,
        <S as StaleContentStore>::Error: Display,
        <S as NotificationSink>::Error: Display,
    {
        self.run_until(store, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run the worker until `shutdown` completes
    ///
    /// On shutdown during a sweep, the sweep is cancelled and the store's
    /// in-flight statement interrupted; the worker waits for the blocking
    /// task to return before stopping.
    pub async fn run_until<S, F>(&self, store: Arc<S>, shutdown: F) -> Result<(), JanitorError>
    where
        S: SweepTarget,
        <S as StaleContentStore>::Error: Display,
        <S as NotificationSink>::Error: Display,
        F: Future<Output = ()>,
    {
        self.cancel.reset();
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!("Janitor worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received, stopping janitor");
                    break;
                }
                _ = ticker.tick() => {
                    tracing::debug!("Starting sweep cycle");

                    let sweep = self.sweep_once(&store);
                    tokio::pin!(sweep);

                    tokio::select! {
                        result = &mut sweep => {
                            if let Err(e) = result {
                                tracing::error!("Sweep failed: {}", e);
                            }
                        }
                        _ = &mut shutdown => {
                            tracing::info!("Shutdown signal received during sweep, interrupting");
                            self.cancel.cancel();
                            store.interrupt();
                            if let Err(e) = sweep.await {
                                tracing::error!("Interrupted sweep failed: {}", e);
                            }
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("Janitor stopped. Final metrics:\n{}", self.metrics().summary());

        Ok(())
    }

    /// Run for a specific number of cycles (useful for testing)
    ///
    /// The first cycle starts immediately.
    pub async fn run_cycles<S>(&self, store: Arc<S>, cycles: usize) -> Result<(), JanitorError>
    where
        S: SweepTarget,
        <S as StaleContentStore>::Error: Display,
        <S as NotificationSink>::Error: Display,
    {
        let mut ticker = interval(self.interval);

        tracing::info!(
            "Janitor worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;

            tracing::debug!("Starting sweep cycle {}/{}", cycle + 1, cycles);

            let report = self.sweep_once(&store).await?;
            tracing::info!(
                "Sweep {}/{} completed: {} warned, {} abandoned, {} dormant",
                cycle + 1,
                cycles,
                report.warned,
                report.abandoned,
                report.dormant
            );
        }

        tracing::info!("Janitor finished {} cycles. Final metrics:\n{}", cycles, self.metrics().summary());

        Ok(())
    }

    /// Snapshot of the janitor's metrics
    pub fn metrics(&self) -> JanitorMetrics {
        self.janitor().metrics().clone()
    }

    /// Reset the janitor's metrics counters
    pub fn reset_metrics(&self) {
        self.janitor().reset_metrics();
    }
}
