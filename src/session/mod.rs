//! Dashboard session: wires the sync core together.
//!
//! One session owns the state store, the notification center, the push
//! connection and the fallback poller. Frames flow through a single
//! dispatch point: the store applies each event first, then both
//! notification projections see the same event.

use crate::config::TeamwatchConfig;
use crate::connection::{
    ConnectionControl, ConnectionManager, ConnectionStatus, Credentials, EventSink, NetworkStatus,
};
use crate::notify::{NotificationCenter, NotificationRecord};
use crate::poller::{ApiClient, ApiError, AuthSignal, StalenessPoller};
use crate::protocol::Event;
use crate::store::Store;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is already running")]
    AlreadyStarted,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Shared handle to the notification center.
pub type SharedNotifications = Arc<Mutex<NotificationCenter>>;

fn lock(center: &SharedNotifications) -> MutexGuard<'_, NotificationCenter> {
    center.lock().unwrap_or_else(|e| e.into_inner())
}

/// The single dispatch point for pushed events.
struct Dispatcher {
    store: Arc<Store>,
    notifications: SharedNotifications,
}

impl EventSink for Dispatcher {
    fn dispatch(&self, event: &Event) {
        self.store.apply(event);
        let emitted = lock(&self.notifications).handle_event(event);
        tracing::trace!(event_type = %event.kind(), emitted, "Event dispatched");
    }
}

pub struct DashboardSession {
    config: TeamwatchConfig,
    store: Arc<Store>,
    notifications: SharedNotifications,
    credentials: Credentials,
    network: NetworkStatus,
    api: Arc<ApiClient>,
    control: Option<ConnectionControl>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    writer: Option<(CancellationToken, JoinHandle<()>)>,
}

impl DashboardSession {
    /// Build a session from configuration. Nothing runs until [`start`](Self::start).
    pub fn new(config: TeamwatchConfig) -> Result<Self, SessionError> {
        let credentials = Credentials::new(config.connection.token.clone());
        let notifications = NotificationCenter::from_config(&config.notifications);
        Self::with_parts(config, credentials, NetworkStatus::default(), notifications)
    }

    /// Build a session around caller-owned credentials, network signal and
    /// notification center.
    pub fn with_parts(
        config: TeamwatchConfig,
        credentials: Credentials,
        network: NetworkStatus,
        notifications: NotificationCenter,
    ) -> Result<Self, SessionError> {
        let api = ApiClient::new(
            &config.connection.api_url,
            Duration::from_secs(config.poller.timeout_seconds),
            credentials.clone(),
        )?;

        Ok(Self {
            config,
            store: Arc::new(Store::new()),
            notifications: Arc::new(Mutex::new(notifications)),
            credentials,
            network,
            api: Arc::new(api),
            control: None,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
            writer: None,
        })
    }

    /// Start the connection manager, the status watcher and (if enabled) the
    /// fallback poller.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.control.is_some() {
            return Err(SessionError::AlreadyStarted);
        }
        self.cancel = CancellationToken::new();

        // Stopped after the other tasks so their last notifications are flushed
        let writer_cancel = CancellationToken::new();
        let writer = lock(&self.notifications).spawn_writer(writer_cancel.clone());
        self.writer = Some((writer_cancel, writer));

        let sink = Arc::new(Dispatcher {
            store: self.store.clone(),
            notifications: self.notifications.clone(),
        });
        let (manager, control) =
            ConnectionManager::new(&self.config.connection, &self.credentials, &self.network, sink);
        self.tasks.push(manager.start(self.cancel.child_token()));

        self.tasks.push(spawn_status_watcher(
            control.subscribe(),
            self.notifications.clone(),
            self.cancel.child_token(),
        ));

        if self.config.poller.enabled {
            let poller = StalenessPoller::new(
                &self.config.poller,
                self.store.clone(),
                control.subscribe(),
                self.api.clone(),
            );
            self.tasks.push(poller.start(self.cancel.child_token()));
        } else {
            tracing::info!("Fallback poller disabled");
        }

        self.control = Some(control);
        tracing::info!("Dashboard session started");
        Ok(())
    }

    /// Cancel every task and wait for them to finish.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Session task ended abnormally");
            }
        }
        if let Some((cancel, writer)) = self.writer.take() {
            cancel.cancel();
            if let Err(e) = writer.await {
                tracing::warn!(error = %e, "Notification writer ended abnormally");
            }
        }
        self.control = None;
        tracing::info!("Dashboard session stopped");
    }

    pub fn is_running(&self) -> bool {
        self.control.is_some()
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn notifications(&self) -> &SharedNotifications {
        &self.notifications
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn network(&self) -> &NetworkStatus {
        &self.network
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Connection handle; `None` until started.
    pub fn connection(&self) -> Option<&ConnectionControl> {
        self.control.as_ref()
    }

    /// New notifications as they are emitted.
    pub fn toasts(&self) -> broadcast::Receiver<NotificationRecord> {
        lock(&self.notifications).subscribe()
    }

    /// Authentication failures reported by the pull endpoints.
    pub fn auth_signals(&self) -> broadcast::Receiver<AuthSignal> {
        self.api.auth_signals()
    }
}

/// Forward connection status changes to the notification center.
fn spawn_status_watcher(
    mut states: watch::Receiver<crate::connection::ConnectionState>,
    notifications: SharedNotifications,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = states.borrow_and_update().status;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let status = states.borrow_and_update().status;
                    if status == last {
                        continue;
                    }
                    tracing::debug!(from = %last, to = %status, "Connection status changed");
                    last = status;
                    if matches!(
                        status,
                        ConnectionStatus::Connected
                            | ConnectionStatus::Reconnecting
                            | ConnectionStatus::Offline
                    ) {
                        lock(&notifications).handle_status(status, Utc::now());
                    }
                }
            }
        }
    })
}
