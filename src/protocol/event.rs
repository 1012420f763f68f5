//! Typed push-channel events.

use super::types::{AgentOutput, RawInboxes, RawTeamInbox, StatsSnapshot, Team};
use serde::Serialize;
use serde_json::Value;

/// Identity fields shared by every frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventMeta {
    /// Raw `timestamp` (or `ts`) scalar, kept verbatim for fingerprinting
    pub timestamp: Option<Value>,
    /// `teamName` carried by the frame, if any
    pub team_name: Option<String>,
}

/// A parsed frame. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub meta: EventMeta,
    pub body: EventBody,
}

/// Type-specific payload of an [`Event`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventBody {
    /// Full state dump, typically sent on (re)connect
    InitialData(InitialData),
    /// Refreshed team list, optionally naming a removed team
    TeamsUpdate {
        teams: Vec<Team>,
        removed_team: Option<String>,
    },
    /// Task change, expressed as a refreshed team snapshot when present
    TaskUpdate {
        teams: Option<Vec<Team>>,
        task: Option<Value>,
    },
    /// Replacement inbox map for `meta.team_name`
    InboxUpdate { inbox: RawTeamInbox },
    /// Replacement agent output list
    AgentOutputsUpdate { outputs: Vec<AgentOutput> },
    /// Any frame type this client does not know about
    Unknown { kind: String, raw: Value },
}

/// Optional collections of an `initial_data` frame.
///
/// Only the fields present on the wire replace store state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialData {
    pub teams: Option<Vec<Team>>,
    pub stats: Option<StatsSnapshot>,
    pub team_history: Option<Vec<Team>>,
    pub inboxes: Option<RawInboxes>,
    pub agent_outputs: Option<Vec<AgentOutput>>,
}

/// Wire tags of the known frame types.
pub mod kind {
    pub const INITIAL_DATA: &str = "initial_data";
    pub const TEAMS_UPDATE: &str = "teams_update";
    pub const TASK_UPDATE: &str = "task_update";
    pub const INBOX_UPDATE: &str = "inbox_update";
    pub const AGENT_OUTPUTS_UPDATE: &str = "agent_outputs_update";
}

impl Event {
    pub fn new(meta: EventMeta, body: EventBody) -> Self {
        Self { meta, body }
    }

    /// The wire `type` tag of this event.
    pub fn kind(&self) -> &str {
        match &self.body {
            EventBody::InitialData(_) => kind::INITIAL_DATA,
            EventBody::TeamsUpdate { .. } => kind::TEAMS_UPDATE,
            EventBody::TaskUpdate { .. } => kind::TASK_UPDATE,
            EventBody::InboxUpdate { .. } => kind::INBOX_UPDATE,
            EventBody::AgentOutputsUpdate { .. } => kind::AGENT_OUTPUTS_UPDATE,
            EventBody::Unknown { kind, .. } => kind,
        }
    }

    pub fn team_name(&self) -> Option<&str> {
        self.meta.team_name.as_deref()
    }

    pub fn timestamp(&self) -> Option<&Value> {
        self.meta.timestamp.as_ref()
    }
}
