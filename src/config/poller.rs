//! Fallback poller configuration

use serde::{Deserialize, Serialize};

/// Staleness detection and pull-refresh settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Whether the fallback poller runs at all
    pub enabled: bool,
    /// Seconds between staleness checks
    pub interval_seconds: u64,
    /// Seconds without push data before the channel counts as stale
    pub stale_threshold_seconds: u64,
    /// Timeout for each pull request
    pub timeout_seconds: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 15,
            stale_threshold_seconds: 20,
            timeout_seconds: 10,
        }
    }
}
