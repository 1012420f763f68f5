//! Capped notification log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Default number of records kept.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Team,
    Task,
    Message,
    Connection,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Team => "team",
            NotificationKind::Task => "task",
            NotificationKind::Message => "message",
            NotificationKind::Connection => "connection",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user-facing notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    /// Dashboard tab the notification navigates to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
}

impl NotificationRecord {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
            read: false,
            tab: None,
        }
    }

    pub fn with_tab(mut self, tab: impl Into<String>) -> Self {
        self.tab = Some(tab.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Newest-first list of notifications, oldest dropped beyond `max_entries`.
#[derive(Debug, Clone)]
pub struct NotificationLog {
    entries: VecDeque<NotificationRecord>,
    max_entries: usize,
}

impl NotificationLog {
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }

    /// Rebuild a log from persisted records (newest first).
    pub fn from_records(records: Vec<NotificationRecord>, max_entries: usize) -> Self {
        let mut log = Self::new(max_entries);
        log.entries.extend(records.into_iter().take(log.max_entries));
        log
    }

    /// Add a record at the front, evicting the oldest if at capacity.
    pub fn push(&mut self, record: NotificationRecord) {
        if self.entries.len() >= self.max_entries {
            self.entries.pop_back();
        }
        self.entries.push_front(record);
    }

    /// All records, newest first.
    pub fn list(&self) -> Vec<NotificationRecord> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.entries.iter()
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|r| !r.read).count()
    }

    /// Mark one record read. Returns `false` if the id is unknown.
    pub fn mark_read(&mut self, id: Uuid) -> bool {
        match self.entries.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.read = true;
                true
            }
            None => false,
        }
    }

    /// Mark every record read, returning how many changed.
    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for record in self.entries.iter_mut().filter(|r| !r.read) {
            record.read = true;
            changed += 1;
        }
        changed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> NotificationRecord {
        NotificationRecord::new(NotificationKind::Team, title, "")
    }

    #[test]
    fn test_push_is_newest_first() {
        let mut log = NotificationLog::default();
        log.push(record("first"));
        log.push(record("second"));

        let titles: Vec<_> = log.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["second", "first"]);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut log = NotificationLog::default();
        for i in 0..105 {
            log.push(record(&format!("n{i}")));
        }

        assert_eq!(log.len(), 100);
        let list = log.list();
        assert_eq!(list[0].title, "n104");
        assert_eq!(list[99].title, "n5");
    }

    #[test]
    fn test_read_tracking() {
        let mut log = NotificationLog::default();
        log.push(record("a"));
        log.push(record("b"));
        let id = log.list()[1].id;

        assert_eq!(log.unread_count(), 2);
        assert!(log.mark_read(id));
        assert!(!log.mark_read(Uuid::new_v4()));
        assert_eq!(log.unread_count(), 1);

        assert_eq!(log.mark_all_read(), 1);
        assert_eq!(log.unread_count(), 0);

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_from_records_truncates() {
        let records: Vec<_> = (0..10).map(|i| record(&i.to_string())).collect();
        let log = NotificationLog::from_records(records, 4);
        assert_eq!(log.len(), 4);
        assert_eq!(log.list()[0].title, "0");
    }

    #[test]
    fn test_record_wire_shape() {
        let value = serde_json::to_value(record("Team Updated: Alpha").with_tab("teams")).unwrap();
        assert_eq!(value["type"], "team");
        assert_eq!(value["read"], false);
        assert_eq!(value["tab"], "teams");
    }
}
