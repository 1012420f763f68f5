//! Inbox projection: one notification per newly appended message.
//!
//! Keeps a seen count per team/agent pair. The first observation of a pair
//! only records its current length, so history already on the wire at
//! startup never notifies.

use super::log::{NotificationKind, NotificationRecord};
use crate::logging::truncate_preview;
use crate::protocol::{Event, EventBody, Message, RawTeamInbox};
use crate::store::{sanitize, InboxKey};
use std::collections::HashMap;

const PREVIEW_CHARS: usize = 140;

#[derive(Debug, Default)]
pub struct InboxNotifier {
    seen: HashMap<(InboxKey, InboxKey), usize>,
}

impl InboxNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages already accounted for on one pair.
    pub fn seen_count(&self, team: &str, agent: &str) -> Option<usize> {
        let key = (sanitize(team)?, sanitize(agent)?);
        self.seen.get(&key).copied()
    }

    /// Number of pairs being tracked.
    pub fn tracked_pairs(&self) -> usize {
        self.seen.len()
    }

    /// Project one pushed event; returns one record per new message.
    pub fn observe(&mut self, event: &Event) -> Vec<NotificationRecord> {
        let mut records = Vec::new();

        match &event.body {
            EventBody::InboxUpdate { inbox } => {
                let Some(team) = event.team_name().and_then(sanitize) else {
                    return records;
                };
                self.observe_team(&team, inbox, &mut records);
            }
            EventBody::InitialData(initial) => {
                if let Some(inboxes) = &initial.inboxes {
                    for (team, inbox) in inboxes {
                        if let Some(team) = sanitize(team) {
                            self.observe_team(&team, inbox, &mut records);
                        }
                    }
                }
            }
            EventBody::TeamsUpdate {
                removed_team: Some(removed),
                ..
            } => {
                let before = self.seen.len();
                self.seen.retain(|(team, _), _| team.as_str() != removed.as_str());
                if self.seen.len() != before {
                    tracing::debug!(team = %removed, "Forgot inbox counts of removed team");
                }
            }
            _ => {}
        }

        records
    }

    fn observe_team(
        &mut self,
        team: &InboxKey,
        inbox: &RawTeamInbox,
        records: &mut Vec<NotificationRecord>,
    ) {
        for (agent, messages) in inbox {
            let Some(agent) = sanitize(agent) else {
                continue;
            };
            let count = messages.len();
            let key = (team.clone(), agent);

            let Some(seen) = self.seen.get(&key).copied() else {
                self.seen.insert(key, count);
                continue;
            };

            if count > seen {
                for message in &messages[seen..] {
                    records.push(message_record(team, &key.1, message));
                }
            } else if count < seen {
                tracing::debug!(
                    team = %team,
                    agent = %key.1,
                    seen,
                    count,
                    "Inbox shrank, re-basing seen count"
                );
            }
            self.seen.insert(key, count);
        }
    }
}

fn message_record(team: &InboxKey, agent: &InboxKey, message: &Message) -> NotificationRecord {
    let from = if message.from.is_empty() {
        "unknown"
    } else {
        message.from.as_str()
    };
    NotificationRecord::new(
        NotificationKind::Message,
        format!("New Message: {from} to {agent}"),
        format!("[{team}] {}", truncate_preview(message.preview(), PREVIEW_CHARS)),
    )
    .with_tab("inbox")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parse_frame;
    use serde_json::json;

    fn inbox_update(team: &str, agent: &str, messages: &[(&str, &str)]) -> Event {
        let messages: Vec<_> = messages
            .iter()
            .map(|(from, text)| json!({"from": from, "text": text}))
            .collect();
        let frame = json!({
            "type": "inbox_update",
            "teamName": team,
            "data": { agent: messages },
        });
        parse_frame(&frame.to_string()).unwrap()
    }

    #[test]
    fn test_first_observation_sets_baseline() {
        let mut notifier = InboxNotifier::new();
        let records = notifier.observe(&inbox_update("Alpha", "dev", &[("lead", "hi"), ("qa", "yo")]));

        assert!(records.is_empty());
        assert_eq!(notifier.seen_count("Alpha", "dev"), Some(2));
    }

    #[test]
    fn test_bundled_messages_fan_out() {
        let mut notifier = InboxNotifier::new();
        notifier.observe(&inbox_update("Alpha", "dev", &[("lead", "first")]));

        let records = notifier.observe(&inbox_update(
            "Alpha",
            "dev",
            &[("lead", "first"), ("qa", "second"), ("ops", "third")],
        ));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "New Message: qa to dev");
        assert!(records[0].message.contains("second"));
        assert_eq!(records[1].title, "New Message: ops to dev");
        assert!(records[1].message.contains("third"));
        assert_eq!(notifier.seen_count("Alpha", "dev"), Some(3));
    }

    #[test]
    fn test_null_sender_still_notifies() {
        let mut notifier = InboxNotifier::new();
        notifier.observe(&inbox_update("Alpha", "dev", &[("lead", "first")]));

        let frame = json!({
            "type": "inbox_update",
            "teamName": "Alpha",
            "data": {"dev": [{"from": "lead", "text": "first"}, {"from": null, "text": "second"}]},
        });
        let records = notifier.observe(&parse_frame(&frame.to_string()).unwrap());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "New Message: unknown to dev");
        assert_eq!(notifier.seen_count("Alpha", "dev"), Some(2));
    }

    #[test]
    fn test_unchanged_count_is_silent() {
        let mut notifier = InboxNotifier::new();
        let event = inbox_update("Alpha", "dev", &[("lead", "hi")]);
        notifier.observe(&event);
        assert!(notifier.observe(&event).is_empty());
    }

    #[test]
    fn test_shrink_rebases_silently() {
        let mut notifier = InboxNotifier::new();
        notifier.observe(&inbox_update("Alpha", "dev", &[("a", "1"), ("b", "2"), ("c", "3")]));
        assert!(notifier
            .observe(&inbox_update("Alpha", "dev", &[("a", "1")]))
            .is_empty());
        assert_eq!(notifier.seen_count("Alpha", "dev"), Some(1));

        let records = notifier.observe(&inbox_update("Alpha", "dev", &[("a", "1"), ("d", "4")]));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_initial_data_counts_per_pair() {
        let mut notifier = InboxNotifier::new();
        let initial = |n: usize| {
            let messages: Vec<_> = (0..n).map(|i| json!({"from": "lead", "text": i.to_string()})).collect();
            parse_frame(
                &json!({
                    "type": "initial_data",
                    "data": {"inboxes": {"Alpha": {"dev": messages}, "__proto__": {"x": []}}}
                })
                .to_string(),
            )
            .unwrap()
        };

        assert!(notifier.observe(&initial(1)).is_empty());
        assert_eq!(notifier.tracked_pairs(), 1);
        assert_eq!(notifier.observe(&initial(2)).len(), 1);
    }

    #[test]
    fn test_invalid_keys_are_ignored() {
        let mut notifier = InboxNotifier::new();
        notifier.observe(&inbox_update("__proto__", "dev", &[("a", "1")]));
        notifier.observe(&inbox_update("Alpha", "constructor", &[("a", "1")]));
        assert_eq!(notifier.tracked_pairs(), 0);
    }

    #[test]
    fn test_removed_team_is_forgotten() {
        let mut notifier = InboxNotifier::new();
        notifier.observe(&inbox_update("Gamma", "dev", &[("a", "1")]));
        notifier.observe(&inbox_update("Alpha", "dev", &[("a", "1")]));

        let removal = parse_frame(r#"{"type":"teams_update","data":[],"removedTeam":"Gamma"}"#)
            .unwrap();
        assert!(notifier.observe(&removal).is_empty());
        assert_eq!(notifier.seen_count("Gamma", "dev"), None);
        assert_eq!(notifier.seen_count("Alpha", "dev"), Some(1));
    }
}
