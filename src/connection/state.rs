//! Connection state machine.
//!
//! Pure transitions with no I/O; the manager task drives them from socket,
//! timer, credential and network events.

use super::backoff::BackoffPolicy;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Lifecycle status of the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Not connected and not trying (no credentials, or disconnected)
    Idle,
    /// Transport handshake in progress
    Connecting,
    /// Session open, frames flowing
    Connected,
    /// Waiting out a backoff delay before the next attempt
    Reconnecting,
    /// Network reported offline; attempts paused
    Offline,
    /// A transport error was just recorded; a close transition follows
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "idle",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Reconnecting => "reconnecting",
            ConnectionStatus::Offline => "offline",
            ConnectionStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection status plus the bookkeeping the poller and UI read.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    /// Failed attempts since the last successful open
    pub attempt_count: u32,
    /// When the last frame arrived; sole input to staleness detection
    pub last_data_received_at: Option<Instant>,
    /// Most recent transport error, cleared on open
    pub last_error: Option<String>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Idle,
            attempt_count: 0,
            last_data_received_at: None,
            last_error: None,
        }
    }
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a session is currently open.
    pub fn is_open(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Time since the last frame, `None` if nothing was ever received.
    pub fn data_age(&self, now: Instant) -> Option<Duration> {
        self.last_data_received_at
            .map(|at| now.saturating_duration_since(at))
    }

    /// `connect()`: start an attempt if credentials are present.
    ///
    /// Offline wins over credentials: the attempt waits for the network.
    pub fn request_connect(&mut self, has_credentials: bool, online: bool) {
        self.status = if !has_credentials {
            ConnectionStatus::Idle
        } else if !online {
            ConnectionStatus::Offline
        } else {
            ConnectionStatus::Connecting
        };
    }

    /// Transport opened.
    pub fn opened(&mut self) {
        self.status = ConnectionStatus::Connected;
        self.attempt_count = 0;
        self.last_error = None;
    }

    /// Transport reported an error. Not terminal: the close that follows
    /// still schedules a reconnect.
    pub fn errored(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
        if matches!(
            self.status,
            ConnectionStatus::Connecting | ConnectionStatus::Connected
        ) {
            self.status = ConnectionStatus::Error;
        }
    }

    /// Transport closed (or failed to open).
    pub fn closed(&mut self, online: bool) {
        if !matches!(
            self.status,
            ConnectionStatus::Connecting | ConnectionStatus::Connected | ConnectionStatus::Error
        ) {
            return;
        }
        self.status = if online {
            ConnectionStatus::Reconnecting
        } else {
            ConnectionStatus::Offline
        };
    }

    /// Delay for the pending reconnect; increments the attempt counter.
    ///
    /// Returns `None` outside `Reconnecting`.
    pub fn schedule_backoff(&mut self, policy: &BackoffPolicy) -> Option<Duration> {
        if self.status != ConnectionStatus::Reconnecting {
            return None;
        }
        let delay = policy.delay(self.attempt_count);
        self.attempt_count = self.attempt_count.saturating_add(1);
        Some(delay)
    }

    /// Backoff timer fired.
    pub fn backoff_elapsed(&mut self) {
        if self.status == ConnectionStatus::Reconnecting {
            self.status = ConnectionStatus::Connecting;
        }
    }

    /// Network went away.
    pub fn went_offline(&mut self) {
        if matches!(
            self.status,
            ConnectionStatus::Connecting
                | ConnectionStatus::Connected
                | ConnectionStatus::Reconnecting
                | ConnectionStatus::Error
        ) {
            self.status = ConnectionStatus::Offline;
        }
    }

    /// Network came back: reconnect at once with a fresh attempt count.
    pub fn went_online(&mut self, has_credentials: bool) {
        if self.status != ConnectionStatus::Offline {
            return;
        }
        self.attempt_count = 0;
        self.status = if has_credentials {
            ConnectionStatus::Connecting
        } else {
            ConnectionStatus::Idle
        };
    }

    /// A token became available, or replaced the previous one.
    pub fn credentials_supplied(&mut self, online: bool) {
        self.attempt_count = 0;
        self.request_connect(true, online);
    }

    /// The token was withdrawn.
    pub fn credentials_withdrawn(&mut self) {
        self.status = ConnectionStatus::Idle;
        self.attempt_count = 0;
    }

    /// Explicit teardown.
    pub fn disconnected(&mut self) {
        self.status = ConnectionStatus::Idle;
    }

    pub fn record_data(&mut self, at: Instant) {
        self.last_data_received_at = Some(at);
    }
}
