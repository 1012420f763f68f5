//! Notification projections over the event stream.
//!
//! Two independent projections consume the same events:
//!
//! - [`EventNotifier`] dedupes by fingerprint and covers team, task and
//!   connection changes.
//! - [`InboxNotifier`] counts messages per team/agent pair and notifies once
//!   per appended message.
//!
//! They share no state. [`NotificationCenter`] feeds both, keeps the capped
//! log, persists it and publishes each new record as a toast.

mod events;
mod fingerprint;
mod inbox;
mod log;
mod persist;
mod writer;

pub use events::EventNotifier;
pub use fingerprint::{fingerprint, fingerprint_parts, FingerprintSet, DEFAULT_CAPACITY};
pub use inbox::InboxNotifier;
pub use log::{NotificationKind, NotificationLog, NotificationRecord, DEFAULT_MAX_ENTRIES};
pub use persist::{
    FileNotificationStore, MemoryNotificationStore, NotificationStore, StoreError, STORE_KEY,
};
pub use writer::{LogSnapshot, PersistWorker};

use crate::config::NotificationConfig;
use crate::connection::ConnectionStatus;
use crate::protocol::Event;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const TOAST_CHANNEL_CAPACITY: usize = 64;

/// Build the configured store: a file under `store_dir`, else in memory.
pub fn store_from_config(config: &NotificationConfig) -> Arc<dyn NotificationStore> {
    match &config.store_dir {
        Some(dir) => Arc::new(FileNotificationStore::new(dir)),
        None => Arc::new(MemoryNotificationStore::new()),
    }
}

pub struct NotificationCenter {
    events: EventNotifier,
    inbox: InboxNotifier,
    log: NotificationLog,
    store: Arc<dyn NotificationStore>,
    toasts: broadcast::Sender<NotificationRecord>,
    writer: Option<watch::Sender<LogSnapshot>>,
}

impl NotificationCenter {
    /// Create a center, restoring the persisted log from `store`.
    pub fn new(config: &NotificationConfig, store: Arc<dyn NotificationStore>) -> Self {
        let log = NotificationLog::from_records(store.load(), config.max_entries);
        let (toasts, _) = broadcast::channel(TOAST_CHANNEL_CAPACITY);
        tracing::debug!(restored = log.len(), "Notification log loaded");

        Self {
            events: EventNotifier::new(config.fingerprint_capacity),
            inbox: InboxNotifier::new(),
            log,
            store,
            toasts,
            writer: None,
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(config, store_from_config(config))
    }

    /// Hand log writes to a background [`PersistWorker`].
    ///
    /// Until this is called, and again once the worker has stopped, every
    /// change is saved inline.
    pub fn spawn_writer(&mut self, cancel_token: CancellationToken) -> JoinHandle<()> {
        let (tx, rx) = watch::channel(Arc::new(self.log.list()));
        self.writer = Some(tx);
        PersistWorker::new(self.store.clone(), rx).start(cancel_token)
    }

    /// Receive every new record as it is emitted.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationRecord> {
        self.toasts.subscribe()
    }

    /// Feed one event to both projections. Returns how many records were emitted.
    pub fn handle_event(&mut self, event: &Event) -> usize {
        let mut records: Vec<NotificationRecord> = self.events.observe(event).into_iter().collect();
        records.extend(self.inbox.observe(event));
        self.emit(records)
    }

    /// Feed a connection status change.
    pub fn handle_status(&mut self, status: ConnectionStatus, at: DateTime<Utc>) -> usize {
        let records = self.events.observe_status(status, at).into_iter().collect();
        self.emit(records)
    }

    pub fn list(&self) -> Vec<NotificationRecord> {
        self.log.list()
    }

    pub fn unread_count(&self) -> usize {
        self.log.unread_count()
    }

    pub fn mark_read(&mut self, id: Uuid) -> bool {
        let changed = self.log.mark_read(id);
        if changed {
            self.persist();
        }
        changed
    }

    pub fn mark_all_read(&mut self) -> usize {
        let changed = self.log.mark_all_read();
        if changed > 0 {
            self.persist();
        }
        changed
    }

    pub fn clear(&mut self) {
        self.log.clear();
        self.persist();
    }

    pub fn event_notifier(&self) -> &EventNotifier {
        &self.events
    }

    pub fn inbox_notifier(&self) -> &InboxNotifier {
        &self.inbox
    }

    fn emit(&mut self, records: Vec<NotificationRecord>) -> usize {
        let count = records.len();
        if count == 0 {
            return 0;
        }

        for record in records {
            tracing::info!(kind = %record.kind, title = %record.title, "Notification");
            // A toast with no listener is simply not shown
            let _ = self.toasts.send(record.clone());
            self.log.push(record);
        }
        self.persist();
        count
    }

    fn persist(&self) {
        let records = self.log.list();
        match &self.writer {
            Some(writer) if !writer.is_closed() => {
                writer.send_replace(Arc::new(records));
            }
            _ => {
                if let Err(e) = self.store.save(&records) {
                    tracing::warn!(error = %e, "Failed to persist notification log");
                }
            }
        }
    }
}
