//! Event projection: team, task and connection notifications.
//!
//! Every emitted notification is keyed by its fingerprint, so a replayed
//! frame never notifies twice. The first frame seen after construction is
//! the initial replay and only primes the set.

use super::fingerprint::{fingerprint, fingerprint_parts, FingerprintSet};
use super::log::{NotificationKind, NotificationRecord};
use crate::connection::ConnectionStatus;
use crate::protocol::{Event, EventBody, Team};
use chrono::{DateTime, Utc};
use serde_json::Value;

const CONNECTION_LOST: &str = "connection_lost";
const CONNECTION_RESTORED: &str = "connection_restored";

#[derive(Debug)]
pub struct EventNotifier {
    seen: FingerprintSet,
    primed: bool,
    was_connected: bool,
    lost: bool,
}

impl EventNotifier {
    pub fn new(fingerprint_capacity: usize) -> Self {
        Self {
            seen: FingerprintSet::new(fingerprint_capacity),
            primed: false,
            was_connected: false,
            lost: false,
        }
    }

    /// Whether the initial replay has been consumed.
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    pub fn fingerprints(&self) -> &FingerprintSet {
        &self.seen
    }

    /// Project one pushed event.
    pub fn observe(&mut self, event: &Event) -> Option<NotificationRecord> {
        let key = fingerprint(event);

        if !self.primed {
            self.primed = true;
            self.seen.insert(key);
            tracing::debug!(event_type = %event.kind(), "Initial replay suppressed");
            return None;
        }

        let record = describe(event)?;
        if !self.seen.insert(key) {
            tracing::trace!(event_type = %event.kind(), "Duplicate event dropped");
            return None;
        }
        Some(record)
    }

    /// Project a connection status change observed at `at`.
    ///
    /// Losing an established session emits "Connection Lost" once; the next
    /// successful open emits "Connection Restored".
    pub fn observe_status(
        &mut self,
        status: ConnectionStatus,
        at: DateTime<Utc>,
    ) -> Option<NotificationRecord> {
        let (kind, record) = match status {
            ConnectionStatus::Connected => {
                self.was_connected = true;
                if !self.lost {
                    return None;
                }
                self.lost = false;
                (
                    CONNECTION_RESTORED,
                    NotificationRecord::new(
                        NotificationKind::Connection,
                        "Connection Restored",
                        "Live updates resumed",
                    ),
                )
            }
            ConnectionStatus::Reconnecting | ConnectionStatus::Offline => {
                if !self.was_connected || self.lost {
                    return None;
                }
                self.lost = true;
                let message = if status == ConnectionStatus::Offline {
                    "Network offline, waiting to reconnect"
                } else {
                    "Reconnecting to server"
                };
                (
                    CONNECTION_LOST,
                    NotificationRecord::new(NotificationKind::Connection, "Connection Lost", message),
                )
            }
            _ => return None,
        };

        let ts = Value::from(at.timestamp_millis());
        if !self.seen.insert(fingerprint_parts(kind, Some(&ts), None)) {
            return None;
        }
        Some(record.with_timestamp(at))
    }
}

impl Default for EventNotifier {
    fn default() -> Self {
        Self::new(super::fingerprint::DEFAULT_CAPACITY)
    }
}

fn team_names(teams: &[Team]) -> String {
    teams
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn task_label(task: Option<&Value>) -> Option<String> {
    let task = task?;
    let subject = task.get("subject").and_then(Value::as_str);
    let id = task.get("id").filter(|v| !v.is_null());
    match (subject, id) {
        (Some(subject), _) => Some(subject.to_string()),
        (None, Some(Value::String(id))) => Some(format!("Task {id}")),
        (None, Some(id)) => Some(format!("Task {id}")),
        (None, None) => None,
    }
}

/// Title and message for the event types that notify.
fn describe(event: &Event) -> Option<NotificationRecord> {
    match &event.body {
        EventBody::TeamsUpdate {
            removed_team: Some(removed),
            ..
        } => Some(
            NotificationRecord::new(
                NotificationKind::Team,
                format!("Team Removed: {removed}"),
                format!("{removed} is no longer active"),
            )
            .with_tab("teams"),
        ),
        EventBody::TeamsUpdate { teams, .. } => {
            let title = if teams.is_empty() {
                "Team Updated".to_string()
            } else {
                format!("Team Updated: {}", team_names(teams))
            };
            let message = match teams.len() {
                1 => "1 team active".to_string(),
                n => format!("{n} teams active"),
            };
            Some(NotificationRecord::new(NotificationKind::Team, title, message).with_tab("teams"))
        }
        EventBody::TaskUpdate { task, .. } => {
            let label = task_label(task.as_ref());
            let message = match (label, event.team_name()) {
                (Some(label), Some(team)) => format!("{label} in {team}"),
                (Some(label), None) => label,
                (None, Some(team)) => format!("A task changed in {team}"),
                (None, None) => "A task changed".to_string(),
            };
            Some(
                NotificationRecord::new(NotificationKind::Task, "Task Updated", message)
                    .with_tab("tasks"),
            )
        }
        _ => None,
    }
}
