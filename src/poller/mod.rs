//! Staleness detector and REST fallback poller.
//!
//! Runs on its own timer, independent of the connection lifecycle. When the
//! push channel is closed or has been quiet for longer than the threshold,
//! the poller pulls `/api/teams` and merges teams, stats and team history
//! into the store. Inboxes and agent outputs are never touched here.

mod client;
mod error;

pub use client::{
    ApiClient, AuthSignal, SnapshotSource, AGENT_OUTPUTS_PATH, INBOXES_PATH, TEAMS_PATH,
};
pub use error::ApiError;

use crate::config::PollerConfig;
use crate::connection::ConnectionState;
use crate::store::Store;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Whether the push channel should be considered stale at `now`.
///
/// A closed transport is always stale, as is one that never delivered data.
pub fn is_stale(state: &ConnectionState, now: Instant, threshold: Duration) -> bool {
    if !state.is_open() {
        return true;
    }
    match state.data_age(now) {
        Some(age) => age > threshold,
        None => true,
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Push data is recent; nothing fetched
    Fresh,
    /// Stale; snapshot fetched and merged
    Refreshed,
    /// Stale; fetch failed and was ignored
    Failed,
}

/// Background task that refreshes the store while the push channel is stale.
pub struct StalenessPoller {
    store: Arc<Store>,
    connection: watch::Receiver<ConnectionState>,
    source: Arc<dyn SnapshotSource>,
    interval: Duration,
    threshold: Duration,
}

impl StalenessPoller {
    pub fn new(
        config: &PollerConfig,
        store: Arc<Store>,
        connection: watch::Receiver<ConnectionState>,
        source: Arc<dyn SnapshotSource>,
    ) -> Self {
        Self {
            store,
            connection,
            source,
            interval: Duration::from_secs(config.interval_seconds),
            threshold: Duration::from_secs(config.stale_threshold_seconds),
        }
    }

    /// Run one staleness check and, if stale, one pull.
    pub async fn tick(&self) -> PollOutcome {
        let now = tokio::time::Instant::now().into_std();
        let stale = {
            let state = self.connection.borrow();
            is_stale(&state, now, self.threshold)
        };
        if !stale {
            tracing::trace!("Push channel fresh, skipping pull");
            return PollOutcome::Fresh;
        }

        match self.source.fetch_teams().await {
            Ok(snapshot) => {
                tracing::debug!(teams = snapshot.teams.len(), "Stale push channel, merged pulled teams");
                self.store.merge_pull(snapshot);
                PollOutcome::Refreshed
            }
            Err(e) => {
                tracing::debug!(error = %e, "Fallback pull failed");
                PollOutcome::Failed
            }
        }
    }

    /// Start the poller background task.
    ///
    /// The first check runs one interval after start. Returns a JoinHandle
    /// that resolves when the token is cancelled.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + self.interval;
            let mut interval = tokio::time::interval_at(start, self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_seconds = self.interval.as_secs(),
                stale_threshold_seconds = self.threshold.as_secs(),
                "Fallback poller started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Fallback poller shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let outcome = self.tick().await;
                        tracing::trace!(?outcome, "Poll cycle completed");
                    }
                }
            }
        })
    }
}
