//! Frame parsing: raw JSON text into [`Event`].

use super::event::{kind, Event, EventBody, EventMeta, InitialData};
use super::types::{AgentOutput, RawInboxes, RawTeamInbox, StatsSnapshot, Team};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons a frame is rejected before it reaches the applier.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("frame has no string 'type' field")]
    MissingType,

    #[error("invalid '{kind}' payload: {message}")]
    InvalidPayload { kind: String, message: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitialDataFrame {
    #[serde(default)]
    data: InitialDataBody,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitialDataBody {
    teams: Option<Vec<Team>>,
    stats: Option<StatsSnapshot>,
    team_history: Option<Vec<Team>>,
    inboxes: Option<RawInboxes>,
    agent_outputs: Option<Vec<AgentOutput>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamsUpdateFrame {
    data: Vec<Team>,
    #[serde(default)]
    removed_team: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskUpdateFrame {
    #[serde(default)]
    data: Option<Vec<Team>>,
    #[serde(default)]
    task: Option<Value>,
}

#[derive(Deserialize)]
struct InboxUpdateFrame {
    data: RawTeamInbox,
}

#[derive(Deserialize)]
struct AgentOutputsFrame {
    data: Vec<AgentOutput>,
}

/// Parse one text frame.
pub fn parse_frame(text: &str) -> Result<Event, ParseError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    parse_value(value)
}

/// Parse an already-decoded frame.
pub fn parse_value(value: Value) -> Result<Event, ParseError> {
    let Value::Object(object) = value else {
        return Err(ParseError::NotAnObject);
    };

    let tag = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingType)?
        .to_string();

    let meta = extract_meta(&object);
    let raw = Value::Object(object);

    let body = match tag.as_str() {
        kind::INITIAL_DATA => {
            let frame: InitialDataFrame = decode(&tag, raw)?;
            EventBody::InitialData(InitialData {
                teams: frame.data.teams,
                stats: frame.data.stats,
                team_history: frame.data.team_history,
                inboxes: frame.data.inboxes,
                agent_outputs: frame.data.agent_outputs,
            })
        }
        kind::TEAMS_UPDATE => {
            let frame: TeamsUpdateFrame = decode(&tag, raw)?;
            EventBody::TeamsUpdate {
                teams: frame.data,
                removed_team: frame.removed_team,
            }
        }
        kind::TASK_UPDATE => {
            let frame: TaskUpdateFrame = decode(&tag, raw)?;
            EventBody::TaskUpdate {
                teams: frame.data,
                task: frame.task,
            }
        }
        kind::INBOX_UPDATE => {
            let frame: InboxUpdateFrame = decode(&tag, raw)?;
            EventBody::InboxUpdate { inbox: frame.data }
        }
        kind::AGENT_OUTPUTS_UPDATE => {
            let frame: AgentOutputsFrame = decode(&tag, raw)?;
            EventBody::AgentOutputsUpdate {
                outputs: frame.data,
            }
        }
        _ => EventBody::Unknown { kind: tag, raw },
    };

    Ok(Event::new(meta, body))
}

fn extract_meta(object: &Map<String, Value>) -> EventMeta {
    let timestamp = object
        .get("timestamp")
        .or_else(|| object.get("ts"))
        .filter(|v| !v.is_null())
        .cloned();
    let team_name = object
        .get("teamName")
        .and_then(Value::as_str)
        .map(str::to_string);

    EventMeta {
        timestamp,
        team_name,
    }
}

fn decode<T: DeserializeOwned>(tag: &str, raw: Value) -> Result<T, ParseError> {
    serde_json::from_value(raw).map_err(|e| ParseError::InvalidPayload {
        kind: tag.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_teams_update_with_removed_team() {
        let event = parse_frame(
            r#"{"type":"teams_update","timestamp":"2024-01-01T00:00:00Z",
                "data":[{"name":"Alpha"},{"name":"Beta"}],"removedTeam":"Gamma"}"#,
        )
        .unwrap();

        assert_eq!(event.kind(), "teams_update");
        assert_eq!(event.timestamp(), Some(&json!("2024-01-01T00:00:00Z")));
        match event.body {
            EventBody::TeamsUpdate {
                teams,
                removed_team,
            } => {
                assert_eq!(teams.len(), 2);
                assert_eq!(removed_team.as_deref(), Some("Gamma"));
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ts_fallback() {
        let event = parse_frame(r#"{"type":"task_update","ts":1700000000}"#).unwrap();
        assert_eq!(event.timestamp(), Some(&json!(1700000000)));
    }

    #[test]
    fn test_parse_task_update_without_teams() {
        let event = parse_frame(r#"{"type":"task_update","teamName":"Alpha","task":{"id":3}}"#)
            .unwrap();
        assert_eq!(event.team_name(), Some("Alpha"));
        match event.body {
            EventBody::TaskUpdate { teams, task } => {
                assert!(teams.is_none());
                assert_eq!(task, Some(json!({"id": 3})));
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_parse_initial_data_partial() {
        let event =
            parse_frame(r#"{"type":"initial_data","data":{"teams":[{"name":"Alpha"}]}}"#).unwrap();
        match event.body {
            EventBody::InitialData(data) => {
                assert_eq!(data.teams.unwrap().len(), 1);
                assert!(data.stats.is_none());
                assert!(data.inboxes.is_none());
                assert!(data.agent_outputs.is_none());
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_parse_inbox_update() {
        let event = parse_frame(
            r#"{"type":"inbox_update","teamName":"Alpha",
                "data":{"worker":[{"from":"lead","text":"hi"}]}}"#,
        )
        .unwrap();
        match event.body {
            EventBody::InboxUpdate { inbox } => assert_eq!(inbox["worker"].len(), 1),
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_parse_task_without_id_keeps_frame() {
        let event = parse_frame(
            r#"{"type":"task_update","data":[{"name":"A","tasks":[{"subject":"no id"},{"id":2}]}]}"#,
        )
        .unwrap();
        match event.body {
            EventBody::TaskUpdate { teams, .. } => {
                let teams = teams.unwrap();
                assert_eq!(teams[0].tasks.len(), 2);
                assert_eq!(teams[0].tasks[0].id, Value::Null);
                assert_eq!(teams[0].tasks[0].subject.as_deref(), Some("no id"));
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_parse_null_fields_keep_frame() {
        let event = parse_frame(
            r#"{"type":"inbox_update","teamName":"Alpha",
                "data":{"worker":[{"from":null,"text":null},{"from":"lead","text":"hi"}]}}"#,
        )
        .unwrap();
        match event.body {
            EventBody::InboxUpdate { inbox } => {
                let messages = &inbox["worker"];
                assert_eq!(messages.len(), 2);
                assert_eq!(messages[0].from, "");
                assert_eq!(messages[0].text, "");
                assert_eq!(messages[1].from, "lead");
            }
            other => panic!("unexpected body: {:?}", other),
        }

        let event = parse_frame(
            r#"{"type":"teams_update","data":[{"name":null,"members":null,"tasks":null},{"name":"B","members":[{"name":null}]}]}"#,
        )
        .unwrap();
        match event.body {
            EventBody::TeamsUpdate { teams, .. } => {
                assert_eq!(teams.len(), 2);
                assert!(teams[0].members.is_empty());
                assert_eq!(teams[1].members[0].name, "");
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_type_keeps_raw() {
        let event = parse_frame(r#"{"type":"archive_ready","id":7}"#).unwrap();
        match event.body {
            EventBody::Unknown { kind, raw } => {
                assert_eq!(kind, "archive_ready");
                assert_eq!(raw["id"], 7);
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_frame("not json"),
            Err(ParseError::InvalidJson(_))
        ));
        assert_eq!(parse_frame("[1,2]"), Err(ParseError::NotAnObject));
        assert_eq!(parse_frame(r#"{"data":[]}"#), Err(ParseError::MissingType));
        assert!(matches!(
            parse_frame(r#"{"type":"teams_update","data":"oops"}"#),
            Err(ParseError::InvalidPayload { ref kind, .. }) if kind == "teams_update"
        ));
    }
}
