//! Shared test utilities for teamwatch integration tests.
//!
//! Provides an in-process WebSocket push server built on axum, plus frame
//! builders and polling helpers.

#![allow(dead_code)]

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

// =============================================================================
// Push Server
// =============================================================================

#[derive(Debug, Clone)]
pub enum ServerCommand {
    /// Send a text frame to every open socket
    Send(String),
    /// Close every open socket
    Close,
}

#[derive(Clone)]
struct ServerState {
    connections: Arc<AtomicUsize>,
    tokens: Arc<Mutex<Vec<Option<String>>>>,
    commands: broadcast::Sender<ServerCommand>,
}

/// WebSocket server that records connection attempts and relays frames.
pub struct PushServer {
    pub addr: SocketAddr,
    state: ServerState,
    handle: JoinHandle<()>,
}

impl PushServer {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self::serve(listener)
    }

    /// Serve on an already-bound listener (lets tests reserve a port first).
    pub fn serve(listener: tokio::net::TcpListener) -> Self {
        let addr = listener.local_addr().unwrap();
        let (commands, _) = broadcast::channel(64);
        let state = ServerState {
            connections: Arc::new(AtomicUsize::new(0)),
            tokens: Arc::new(Mutex::new(Vec::new())),
            commands,
        };

        let app = Router::new()
            .route("/ws", get(ws_handler))
            .with_state(state.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// `token` query parameter of every accepted handshake, in order.
    pub fn tokens(&self) -> Vec<Option<String>> {
        self.state.tokens.lock().unwrap().clone()
    }

    pub fn send(&self, frame: impl Into<String>) {
        let _ = self.state.commands.send(ServerCommand::Send(frame.into()));
    }

    pub fn send_json(&self, frame: Value) {
        self.send(frame.to_string());
    }

    pub fn close_all(&self) {
        let _ = self.state.commands.send(ServerCommand::Close);
    }

    pub async fn wait_for_connections(&self, n: usize) {
        wait_until(|| self.connections() >= n).await;
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<ServerState>,
) -> impl IntoResponse {
    state
        .tokens
        .lock()
        .unwrap()
        .push(params.get("token").cloned());
    // Subscribed before upgrade: frames sent once the connection is counted reach this socket
    let commands = state.commands.subscribe();
    state.connections.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |socket| handle_socket(socket, commands))
}

async fn handle_socket(mut socket: WebSocket, mut commands: broadcast::Receiver<ServerCommand>) {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Ok(ServerCommand::Send(text)) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Ok(ServerCommand::Close) | Err(_) => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

// =============================================================================
// Frame Builders
// =============================================================================

pub fn teams_update(ts: u64, names: &[&str]) -> Value {
    let teams: Vec<_> = names.iter().map(|n| json!({"name": n})).collect();
    json!({"type": "teams_update", "ts": ts, "data": teams})
}

pub fn initial_data(names: &[&str]) -> Value {
    let teams: Vec<_> = names.iter().map(|n| json!({"name": n})).collect();
    json!({"type": "initial_data", "data": {"teams": teams, "inboxes": {}}})
}

pub fn inbox_update(team: &str, agent: &str, texts: &[&str]) -> Value {
    let messages: Vec<_> = texts
        .iter()
        .map(|t| json!({"from": "lead", "text": t}))
        .collect();
    json!({"type": "inbox_update", "teamName": team, "data": { agent: messages }})
}

// =============================================================================
// Polling
// =============================================================================

/// Poll `condition` every 10ms until it holds; panics after 5 seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not met within 5s");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
