//! Push-channel connection manager.
//!
//! Owns the WebSocket session lifecycle: connect, exponential-backoff
//! reconnect, pause while offline, and immediate reconnect when a token
//! appears. Every received frame updates `last_data_received_at` before it
//! is parsed and handed to the [`EventSink`].

mod backoff;
mod credentials;
mod error;
mod network;
mod state;
mod target;

pub use backoff::BackoffPolicy;
pub use credentials::Credentials;
pub use error::ConnectionError;
pub use network::NetworkStatus;
pub use state::{ConnectionState, ConnectionStatus};
pub use target::{redacted, target_url, TOKEN_PARAM};

use crate::config::ConnectionConfig;
use crate::logging::frame_preview;
use crate::protocol::{parse_frame, Event};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Consumer of parsed events, called in arrival order from the connection task.
pub trait EventSink: Send + Sync + 'static {
    fn dispatch(&self, event: &Event);
}

impl<F> EventSink for F
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    fn dispatch(&self, event: &Event) {
        self(event)
    }
}

/// Requests accepted by a running manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Tear down any session and connect again now
    Connect,
    /// Tear down any session and stay idle
    Disconnect,
}

/// Cloneable handle for steering and observing a running manager.
#[derive(Debug, Clone)]
pub struct ConnectionControl {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
}

impl ConnectionControl {
    /// Reconnect now, replacing any live session.
    pub fn connect(&self) {
        let _ = self.commands.send(Command::Connect);
    }

    /// Close the session and stop reconnecting until the next `connect()`.
    pub fn disconnect(&self) {
        let _ = self.commands.send(Command::Disconnect);
    }

    /// Current state snapshot.
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

enum Input {
    Shutdown,
    Command(Command),
    CredentialsChanged,
    NetworkChanged,
}

enum Flow {
    Continue,
    Stop,
}

/// Background task managing the push channel.
pub struct ConnectionManager {
    url: String,
    policy: BackoffPolicy,
    credentials: watch::Receiver<Option<String>>,
    network: watch::Receiver<bool>,
    commands: mpsc::UnboundedReceiver<Command>,
    sink: Arc<dyn EventSink>,
    state: ConnectionState,
    state_tx: watch::Sender<ConnectionState>,
    had_credentials: bool,
    backoff_deadline: Option<Instant>,
}

impl ConnectionManager {
    /// Create a manager and the control handle that steers it.
    pub fn new(
        config: &ConnectionConfig,
        credentials: &Credentials,
        network: &NetworkStatus,
        sink: Arc<dyn EventSink>,
    ) -> (Self, ConnectionControl) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::new());

        let manager = Self {
            url: config.url.clone(),
            policy: BackoffPolicy::from_config(config),
            credentials: credentials.subscribe(),
            network: network.subscribe(),
            commands: commands_rx,
            sink,
            state: ConnectionState::new(),
            state_tx,
            had_credentials: false,
            backoff_deadline: None,
        };
        let control = ConnectionControl {
            commands: commands_tx,
            state: state_rx,
        };

        (manager, control)
    }

    /// Start the manager background task; it performs the initial `connect()`.
    /// Returns a JoinHandle that resolves when the token is cancelled.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(url = %self.url, "Connection manager started");
            self.run(cancel_token).await;
        })
    }

    async fn run(mut self, cancel: CancellationToken) {
        self.had_credentials = self.credentials.borrow_and_update().is_some();
        let online = *self.network.borrow_and_update();
        self.state.request_connect(self.had_credentials, online);
        if !self.had_credentials {
            tracing::info!("No credentials yet, waiting before connecting");
        }

        loop {
            if self.state.status != ConnectionStatus::Reconnecting {
                self.backoff_deadline = None;
            }
            self.publish();

            let flow = match self.state.status {
                ConnectionStatus::Connecting => self.attempt(&cancel).await,
                ConnectionStatus::Reconnecting => self.wait_backoff(&cancel).await,
                ConnectionStatus::Idle
                | ConnectionStatus::Offline
                | ConnectionStatus::Connected
                | ConnectionStatus::Error => {
                    let input = self.next_input(&cancel).await;
                    self.handle_input(input)
                }
            };

            if let Flow::Stop = flow {
                break;
            }
        }

        self.state.disconnected();
        self.publish();
        tracing::info!("Connection manager shutting down");
    }

    /// One connect attempt; runs the session to its end on success.
    async fn attempt(&mut self, cancel: &CancellationToken) -> Flow {
        let token = self.credentials.borrow().clone();
        let url = match target_url(&self.url, token.as_deref()) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot build push URL, staying idle");
                self.state.last_error = Some(e.to_string());
                self.state.disconnected();
                return Flow::Continue;
            }
        };

        tracing::debug!(
            url = %redacted(&url),
            attempt = self.state.attempt_count,
            "Connecting to push channel"
        );

        let result = tokio::select! {
            input = self.next_input(cancel) => return self.handle_input(input),
            result = connect_async(url.as_str()) => result,
        };

        match result {
            Ok((ws, _response)) => {
                self.state.opened();
                self.publish();
                tracing::info!(url = %redacted(&url), "Push channel connected");
                self.run_session(ws, cancel).await
            }
            Err(e) => {
                tracing::debug!(error = %e, "Push channel connect failed");
                self.state.errored(e.to_string());
                self.publish();
                self.state.closed(*self.network.borrow());
                Flow::Continue
            }
        }
    }

    /// Read frames until the session ends or an input supersedes it.
    async fn run_session(&mut self, mut ws: WsStream, cancel: &CancellationToken) -> Flow {
        loop {
            tokio::select! {
                input = self.next_input(cancel) => {
                    let flow = self.handle_input(input);
                    if matches!(flow, Flow::Stop) || !self.state.is_open() {
                        let _ = ws.close(None).await;
                        return flow;
                    }
                }
                message = ws.next() => {
                    let online = *self.network.borrow();
                    match message {
                        Some(Ok(WsMessage::Text(text))) => self.on_frame(&text),
                        Some(Ok(WsMessage::Close(frame))) => {
                            tracing::info!(?frame, "Push channel closed by server");
                            self.state.closed(online);
                            return Flow::Continue;
                        }
                        // tungstenite answers pings itself; binary frames are not part of the protocol
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::info!(error = %e, "Push channel error");
                            self.state.errored(e.to_string());
                            self.publish();
                            self.state.closed(online);
                            return Flow::Continue;
                        }
                        None => {
                            tracing::info!("Push channel stream ended");
                            self.state.closed(online);
                            return Flow::Continue;
                        }
                    }
                }
            }
        }
    }

    async fn wait_backoff(&mut self, cancel: &CancellationToken) -> Flow {
        let deadline = match self.backoff_deadline {
            Some(deadline) => deadline,
            None => {
                let delay = self.state.schedule_backoff(&self.policy).unwrap_or_default();
                tracing::info!(
                    delay_ms = delay.as_millis() as u64,
                    attempt = self.state.attempt_count,
                    "Scheduling reconnect"
                );
                self.publish();
                let deadline = Instant::now() + delay;
                self.backoff_deadline = Some(deadline);
                deadline
            }
        };

        tokio::select! {
            input = self.next_input(cancel) => self.handle_input(input),
            _ = tokio::time::sleep_until(deadline) => {
                self.backoff_deadline = None;
                self.state.backoff_elapsed();
                Flow::Continue
            }
        }
    }

    fn on_frame(&mut self, text: &str) {
        self.state.record_data(Instant::now().into_std());
        self.publish();

        match parse_frame(text) {
            Ok(event) => {
                tracing::trace!(event_type = %event.kind(), "Frame received");
                self.sink.dispatch(&event);
            }
            Err(e) => {
                tracing::warn!(error = %e, frame = %frame_preview(text), "Dropping malformed frame");
            }
        }
    }

    async fn next_input(&mut self, cancel: &CancellationToken) -> Input {
        tokio::select! {
            _ = cancel.cancelled() => Input::Shutdown,
            Some(command) = self.commands.recv() => Input::Command(command),
            Ok(()) = self.credentials.changed() => Input::CredentialsChanged,
            Ok(()) = self.network.changed() => Input::NetworkChanged,
        }
    }

    fn handle_input(&mut self, input: Input) -> Flow {
        let online = *self.network.borrow_and_update();
        let has_credentials = self.credentials.borrow_and_update().is_some();

        match input {
            Input::Shutdown => return Flow::Stop,
            Input::Command(Command::Connect) => {
                tracing::debug!("connect() requested");
                self.state.request_connect(has_credentials, online);
            }
            Input::Command(Command::Disconnect) => {
                tracing::info!("Disconnect requested");
                self.state.disconnected();
            }
            Input::CredentialsChanged => {
                if !has_credentials {
                    tracing::info!("Credentials withdrawn, disconnecting");
                    self.state.credentials_withdrawn();
                } else {
                    if self.had_credentials {
                        tracing::debug!("Token rotated, reconnecting");
                    } else {
                        tracing::info!("Credentials supplied, connecting immediately");
                    }
                    self.state.credentials_supplied(online);
                }
            }
            Input::NetworkChanged => {
                if online {
                    tracing::info!("Network online");
                    self.state.went_online(has_credentials);
                } else {
                    tracing::info!("Network offline, pausing reconnects");
                    self.state.went_offline();
                }
            }
        }

        self.had_credentials = has_credentials;
        Flow::Continue
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}
