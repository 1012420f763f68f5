//! Push channel and REST endpoint configuration

use serde::{Deserialize, Serialize};

/// Where the dashboard connects and how it backs off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// WebSocket endpoint of the push channel (`ws://` or `wss://`)
    pub url: String,
    /// Base URL of the pull endpoints (`/api/teams`, ...)
    pub api_url: String,
    /// Bearer token; usually supplied through `TEAMWATCH_TOKEN` instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// First reconnect delay in milliseconds
    pub backoff_base_ms: u64,
    /// Upper bound of the reconnect delay in milliseconds
    pub backoff_max_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:3001/ws".to_string(),
            api_url: "http://localhost:3001".to_string(),
            token: None,
            backoff_base_ms: 1000,
            backoff_max_ms: 30_000,
        }
    }
}
