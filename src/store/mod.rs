//! Local snapshot of server state.
//!
//! [`StateStore`] is a plain value; [`Store`] is the shared handle that
//! publishes every new snapshot through a `watch` channel. Updates always
//! replace the whole snapshot, so readers never see a half-applied event.

mod apply;
mod keys;

pub use apply::{apply_event, merge_teams_snapshot};
pub use keys::{sanitize, InboxKey, KeyError, RESERVED_KEYS};

use crate::protocol::{
    AgentOutput, Event, Message, RawInboxes, RawTeamInbox, StatsSnapshot, Team, TeamsSnapshot,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Messages of one team, keyed by agent.
pub type TeamInbox = BTreeMap<InboxKey, Vec<Message>>;

/// All inboxes, keyed by team then agent.
pub type Inboxes = BTreeMap<InboxKey, TeamInbox>;

/// The five collections mirrored from the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateStore {
    pub teams: Vec<Team>,
    pub stats: Option<StatsSnapshot>,
    pub team_history: Vec<Team>,
    pub agent_outputs: Vec<AgentOutput>,
    pub inboxes: Inboxes,
}

impl StateStore {
    /// Messages for one agent of one team.
    pub fn inbox(&self, team: &str, agent: &str) -> Option<&[Message]> {
        self.inboxes
            .get(team)
            .and_then(|agents| agents.get(agent))
            .map(Vec::as_slice)
    }

    /// Total number of messages across all inboxes.
    pub fn message_count(&self) -> usize {
        self.inboxes
            .values()
            .flat_map(|agents| agents.values())
            .map(Vec::len)
            .sum()
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.name == name)
    }
}

/// Validate the agent keys of one team's inbox, dropping rejected ones.
pub fn sanitize_team_inbox(raw: RawTeamInbox) -> TeamInbox {
    raw.into_iter()
        .filter_map(|(agent, messages)| match InboxKey::new(&agent) {
            Ok(key) => Some((key, messages)),
            Err(e) => {
                tracing::warn!(agent = %agent, error = %e, "Dropping inbox with invalid agent key");
                None
            }
        })
        .collect()
}

/// Validate every team and agent key of an inboxes payload.
pub fn sanitize_inboxes(raw: RawInboxes) -> Inboxes {
    raw.into_iter()
        .filter_map(|(team, agents)| match InboxKey::new(&team) {
            Ok(key) => Some((key, sanitize_team_inbox(agents))),
            Err(e) => {
                tracing::warn!(team = %team, error = %e, "Dropping inboxes with invalid team key");
                None
            }
        })
        .collect()
}

/// Shared, observable handle to the current [`StateStore`].
///
/// The applier and the fallback poller are the only writers.
#[derive(Debug)]
pub struct Store {
    tx: watch::Sender<Arc<StateStore>>,
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(StateStore::default())
    }

    pub fn with_state(state: StateStore) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(state));
        Self { tx }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<StateStore> {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every replacement.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StateStore>> {
        self.tx.subscribe()
    }

    /// Apply one pushed event.
    pub fn apply(&self, event: &Event) {
        self.tx
            .send_modify(|current| *current = Arc::new(apply_event(current, event)));
    }

    /// Merge a pulled teams snapshot (fallback path).
    pub fn merge_pull(&self, snapshot: TeamsSnapshot) {
        self.tx
            .send_modify(|current| *current = Arc::new(merge_teams_snapshot(current, snapshot)));
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parse_frame;

    #[test]
    fn test_store_publishes_whole_snapshots() {
        let store = Store::new();
        let mut rx = store.subscribe();
        let before = store.snapshot();

        store.apply(&parse_frame(r#"{"type":"teams_update","data":[{"name":"Alpha"}]}"#).unwrap());

        assert!(rx.has_changed().unwrap());
        let after = rx.borrow_and_update().clone();
        assert_eq!(after.teams.len(), 1);
        // Earlier snapshot is untouched
        assert!(before.teams.is_empty());
    }

    #[test]
    fn test_inbox_lookup_and_count() {
        let store = Store::new();
        store.apply(
            &parse_frame(
                r#"{"type":"inbox_update","teamName":"Alpha",
                    "data":{"lead":[{"from":"a","text":"1"},{"from":"b","text":"2"}]}}"#,
            )
            .unwrap(),
        );
        let state = store.snapshot();
        assert_eq!(state.inbox("Alpha", "lead").unwrap().len(), 2);
        assert!(state.inbox("Alpha", "other").is_none());
        assert_eq!(state.message_count(), 2);
    }

    #[test]
    fn test_merge_pull_through_handle() {
        let store = Store::new();
        store.merge_pull(TeamsSnapshot {
            teams: vec![Team::named("Polled")],
            stats: None,
            team_history: vec![],
        });
        assert!(store.snapshot().team("Polled").is_some());
    }
}
