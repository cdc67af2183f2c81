//! Snapshot poller: fetch, compare, publish on change

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::publisher::ReloadPublisher;
use super::source::SnapshotSource;
use super::stats::{PollOutcome, PollerStats};
use crate::types::{NotificationMessage, VoteCountSnapshot};

/// Default poll period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(8);

/// Periodically samples a [`SnapshotSource`] and reports changes
pub struct SnapshotPoller<S> {
    source: S,
    snapshot: VoteCountSnapshot,
    stats: Arc<PollerStats>,
}

impl<S: SnapshotSource> SnapshotPoller<S> {
    pub fn new(source: S) -> Self {
        Self::with_stats(source, Arc::new(PollerStats::new()))
    }

    pub fn with_stats(source: S, stats: Arc<PollerStats>) -> Self {
        Self {
            source,
            snapshot: VoteCountSnapshot::new(),
            stats,
        }
    }

    pub fn snapshot(&self) -> &VoteCountSnapshot {
        &self.snapshot
    }

    pub fn stats(&self) -> Arc<PollerStats> {
        Arc::clone(&self.stats)
    }

    /// Fetch one sample and compare it against the cached snapshot
    ///
    /// A failed fetch leaves the snapshot untouched, so the next cycle
    /// compares against the same baseline.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let outcome = match self.source.fetch().await {
            Ok(sample) => {
                if self.snapshot.observe(sample) {
                    PollOutcome::Changed
                } else {
                    PollOutcome::Unchanged
                }
            }
            Err(e) if e.is_transient() => {
                warn!("Skipping poll cycle: {}", e);
                PollOutcome::Skipped
            }
            Err(e) => {
                error!("Skipping poll cycle: {}", e);
                PollOutcome::Skipped
            }
        };

        self.stats.record(outcome, self.snapshot.row_count());
        outcome
    }

    /// Run one cycle and publish a reload notification if anything changed
    pub async fn tick<P: ReloadPublisher>(&mut self, publisher: &P) -> PollOutcome {
        let outcome = self.poll_once().await;
        if outcome != PollOutcome::Changed {
            return outcome;
        }

        info!(row_count = ?self.snapshot.row_count(), "Vote data changed");
        match publisher.publish(&NotificationMessage::data_reload()).await {
            Ok(receivers) => debug!("Reload notification sent to {} receiver(s)", receivers),
            Err(e) if e.is_transient() => warn!("Failed to publish reload notification: {}", e),
            Err(e) => error!("Failed to publish reload notification: {}", e),
        }
        outcome
    }
}

impl<S: SnapshotSource + 'static> SnapshotPoller<S> {
    /// Spawn the poll loop on the current runtime
    ///
    /// The first cycle runs immediately. A cycle that overruns the period
    /// delays the next one instead of bunching them up.
    pub fn start<P>(mut self, publisher: P, period: Duration) -> PollerHandle
    where
        P: ReloadPublisher + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;

                    _ = &mut shutdown_rx => break,

                    _ = timer.tick() => {
                        self.tick(&publisher).await;
                    }
                }
            }
            debug!("Poller stopped");
        });

        info!("Polling every {:?}", period);
        PollerHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Handle to a running poll loop
///
/// Dropping the handle also stops the loop after its current cycle.
pub struct PollerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Cancel the timer and wait for an in-flight cycle to finish
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!("Poller task ended abnormally: {}", e);
        }
    }
}
