//! Wire types shared by the push channel and the pull endpoints.
//!
//! Every struct keeps unrecognised fields in `extra` so that a newer server
//! can add data without the client silently dropping it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Read an explicit `null` as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A team of agents as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub members: Vec<TeamMember>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Team {
    /// Minimal team with only a name; used by tests and the CLI.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            members: Vec::new(),
            tasks: Vec::new(),
            created_at: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Aggregate counters shown in the dashboard header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_teams: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_agents: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tasks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_tasks: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One captured chunk of agent output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A message addressed to one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, deserialize_with = "null_as_default")]
    pub from: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub read: bool,
}

impl Message {
    /// Short human-readable body: the summary when present, else the text.
    pub fn preview(&self) -> &str {
        match self.summary.as_deref() {
            Some(summary) if !summary.is_empty() => summary,
            _ => &self.text,
        }
    }
}

/// Inbox payload keyed by raw (unvalidated) agent name.
pub type RawTeamInbox = BTreeMap<String, Vec<Message>>;

/// Inboxes payload keyed by raw team name, then raw agent name.
pub type RawInboxes = BTreeMap<String, RawTeamInbox>;

/// Body of `GET /api/teams`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsSnapshot {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub stats: Option<StatsSnapshot>,
    #[serde(default)]
    pub team_history: Vec<Team>,
}

/// Body of `GET /api/inboxes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboxesResponse {
    #[serde(default)]
    pub inboxes: RawInboxes,
}

/// Body of `GET /api/agent-outputs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentOutputsResponse {
    #[serde(default)]
    pub outputs: Vec<AgentOutput>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_keeps_unknown_fields() {
        let team: Team = serde_json::from_str(
            r#"{"name": "Alpha", "leadAgentId": "a-1", "members": [{"name": "lead"}]}"#,
        )
        .unwrap();
        assert_eq!(team.name, "Alpha");
        assert_eq!(team.members.len(), 1);
        assert_eq!(team.extra.get("leadAgentId").unwrap(), "a-1");

        let back = serde_json::to_value(&team).unwrap();
        assert_eq!(back["leadAgentId"], "a-1");
    }

    #[test]
    fn test_message_preview_prefers_summary() {
        let msg: Message =
            serde_json::from_str(r#"{"from": "lead", "text": "long body", "summary": "short"}"#)
                .unwrap();
        assert_eq!(msg.preview(), "short");

        let msg: Message = serde_json::from_str(r#"{"from": "lead", "text": "body"}"#).unwrap();
        assert_eq!(msg.preview(), "body");
        assert!(!msg.read);
    }

    #[test]
    fn test_teams_snapshot_defaults() {
        let snapshot: TeamsSnapshot = serde_json::from_str(r#"{"teams": []}"#).unwrap();
        assert!(snapshot.stats.is_none());
        assert!(snapshot.team_history.is_empty());
    }

    #[test]
    fn test_stats_camel_case() {
        let stats: StatsSnapshot =
            serde_json::from_str(r#"{"totalTeams": 2, "completedTasks": 5}"#).unwrap();
        assert_eq!(stats.total_teams, Some(2));
        assert_eq!(stats.completed_tasks, Some(5));
    }
}
