//! Notification log persistence.
//!
//! Records are stored as a JSON array under [`STORE_KEY`]. Anything that
//! cannot be read back loads as an empty list.

use super::log::NotificationRecord;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Fixed key of the persisted log.
pub const STORE_KEY: &str = "teamwatch.notifications";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Backing store for the notification log.
pub trait NotificationStore: Send + Sync {
    /// Load persisted records, newest first. Never fails: unreadable data is empty.
    fn load(&self) -> Vec<NotificationRecord>;

    /// Replace the persisted records.
    fn save(&self, records: &[NotificationRecord]) -> Result<(), StoreError>;
}

fn decode(raw: &str, origin: &str) -> Vec<NotificationRecord> {
    match serde_json::from_str(raw) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(origin, error = %e, "Discarding unreadable notification log");
            Vec::new()
        }
    }
}

/// JSON file at `<dir>/teamwatch.notifications.json`.
#[derive(Debug, Clone)]
pub struct FileNotificationStore {
    path: PathBuf,
}

impl FileNotificationStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NotificationStore for FileNotificationStore {
    fn load(&self) -> Vec<NotificationRecord> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw, &self.path.display().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Cannot read notification log");
                Vec::new()
            }
        }
    }

    fn save(&self, records: &[NotificationRecord]) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string(records)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-process store holding the serialized log.
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    raw: Mutex<Option<String>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw stored text.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl NotificationStore for MemoryNotificationStore {
    fn load(&self) -> Vec<NotificationRecord> {
        match self.raw().as_deref() {
            Some(raw) => decode(raw, "memory"),
            None => Vec::new(),
        }
    }

    fn save(&self, records: &[NotificationRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string(records)?;
        *self.raw.lock().unwrap_or_else(|e| e.into_inner()) = Some(json);
        Ok(())
    }
}
