//! Notification log configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Directory holding the persisted log; `None` keeps it in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,
    /// Maximum number of records kept (oldest dropped first)
    pub max_entries: usize,
    /// Fingerprints remembered for duplicate suppression
    pub fingerprint_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            store_dir: None,
            max_entries: 100,
            fingerprint_capacity: 500,
        }
    }
}
