//! Event applier: `(StateStore, Event) -> StateStore`.
//!
//! Total over every event. Frames that cannot be applied are logged and
//! leave the state as it was.

use super::keys::sanitize;
use super::{sanitize_inboxes, sanitize_team_inbox, StateStore};
use crate::protocol::{Event, EventBody, InitialData, TeamsSnapshot};

/// Produce the state that results from applying `event` to `state`.
pub fn apply_event(state: &StateStore, event: &Event) -> StateStore {
    let mut next = state.clone();

    match &event.body {
        EventBody::InitialData(data) => apply_initial_data(&mut next, data),
        EventBody::TeamsUpdate {
            teams,
            removed_team,
        } => {
            next.teams = teams.clone();
            if let Some(removed) = removed_team {
                match sanitize(removed) {
                    Some(key) => {
                        if next.inboxes.remove(&key).is_some() {
                            tracing::debug!(team = %key, "Dropped inboxes of removed team");
                        }
                    }
                    None => {
                        tracing::warn!(team = %removed, "Ignoring invalid removedTeam key");
                    }
                }
            }
        }
        EventBody::TaskUpdate { teams, .. } => match teams {
            Some(teams) => next.teams = teams.clone(),
            None => {
                // Task diffs are not reconstructed; only full team snapshots apply.
                tracing::debug!(
                    team = ?event.team_name(),
                    "task_update without team snapshot, teams unchanged"
                );
            }
        },
        EventBody::InboxUpdate { inbox } => {
            let Some(raw_team) = event.team_name() else {
                tracing::warn!("inbox_update without teamName dropped");
                return next;
            };
            let Some(team) = sanitize(raw_team) else {
                tracing::warn!(team = %raw_team, "inbox_update with invalid team key dropped");
                return next;
            };
            next.inboxes.insert(team, sanitize_team_inbox(inbox.clone()));
        }
        EventBody::AgentOutputsUpdate { outputs } => {
            next.agent_outputs = outputs.clone();
        }
        EventBody::Unknown { kind, .. } => {
            tracing::warn!(event_type = %kind, "Unknown event type, state unchanged");
        }
    }

    next
}

fn apply_initial_data(next: &mut StateStore, data: &InitialData) {
    if let Some(teams) = &data.teams {
        next.teams = teams.clone();
    }
    if let Some(stats) = &data.stats {
        next.stats = Some(stats.clone());
    }
    if let Some(history) = &data.team_history {
        next.team_history = history.clone();
    }
    if let Some(inboxes) = &data.inboxes {
        next.inboxes = sanitize_inboxes(inboxes.clone());
    }
    if let Some(outputs) = &data.agent_outputs {
        next.agent_outputs = outputs.clone();
    }
}

/// Merge a pulled `/api/teams` snapshot.
///
/// Replaces `teams` and `team_history`, and `stats` when the response has
/// them. Inboxes and agent outputs are push-only and never touched here.
pub fn merge_teams_snapshot(state: &StateStore, snapshot: TeamsSnapshot) -> StateStore {
    let mut next = state.clone();
    next.teams = snapshot.teams;
    next.team_history = snapshot.team_history;
    if snapshot.stats.is_some() {
        next.stats = snapshot.stats;
    }
    next
}
