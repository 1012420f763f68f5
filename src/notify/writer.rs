//! Background writer for the notification log.
//!
//! The center publishes whole log snapshots on a `watch` channel; the writer
//! saves the latest one on the blocking pool. Snapshots published while a
//! save is running collapse into one write.

use super::{NotificationRecord, NotificationStore};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Full log contents at one point in time, newest first.
pub type LogSnapshot = Arc<Vec<NotificationRecord>>;

pub struct PersistWorker {
    store: Arc<dyn NotificationStore>,
    pending: watch::Receiver<LogSnapshot>,
    written: LogSnapshot,
}

impl PersistWorker {
    pub(crate) fn new(store: Arc<dyn NotificationStore>, mut pending: watch::Receiver<LogSnapshot>) -> Self {
        let written = pending.borrow_and_update().clone();
        Self {
            store,
            pending,
            written,
        }
    }

    /// Start the writer. On cancellation the latest snapshot is flushed
    /// before the returned handle resolves.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::debug!("Notification writer started");
            self.run(cancel_token).await;
        })
    }

    async fn run(mut self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = self.pending.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = self.pending.borrow_and_update().clone();
                    self.write(snapshot).await;
                }
            }
        }

        let latest = self.pending.borrow().clone();
        if !Arc::ptr_eq(&latest, &self.written) {
            self.write(latest).await;
        }
        tracing::debug!("Notification writer stopped");
    }

    async fn write(&mut self, snapshot: LogSnapshot) {
        let store = self.store.clone();
        let records = snapshot.clone();
        match tokio::task::spawn_blocking(move || store.save(&records)).await {
            Ok(Ok(())) => tracing::trace!(records = snapshot.len(), "Notification log saved"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Failed to persist notification log"),
            Err(e) => tracing::warn!(error = %e, "Notification log save task failed"),
        }
        self.written = snapshot;
    }
}
