//! Output formatting helpers for CLI commands

use crate::connection::ConnectionStatus;
use crate::notify::{NotificationKind, NotificationRecord};
use crate::store::StateStore;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Colored label for a connection status.
pub fn format_status(status: ConnectionStatus) -> String {
    match status {
        ConnectionStatus::Connected => "connected".green().to_string(),
        ConnectionStatus::Connecting => "connecting".cyan().to_string(),
        ConnectionStatus::Reconnecting => "reconnecting".yellow().to_string(),
        ConnectionStatus::Offline => "offline".red().to_string(),
        ConnectionStatus::Error => "error".red().bold().to_string(),
        ConnectionStatus::Idle => "idle".dimmed().to_string(),
    }
}

/// One-line rendering of a notification for the live feed.
pub fn format_notification_line(record: &NotificationRecord) -> String {
    let time = record.timestamp.format("%H:%M:%S").to_string();
    let title = match record.kind {
        NotificationKind::Team => record.title.blue().bold(),
        NotificationKind::Task => record.title.magenta().bold(),
        NotificationKind::Message => record.title.green().bold(),
        NotificationKind::Connection => record.title.yellow().bold(),
    };
    format!("{} {} {}", time.dimmed(), title, record.message)
}

/// Format the team list, stats and inbox counts of a snapshot.
pub fn format_snapshot_tables(state: &StateStore) -> String {
    let mut teams = table(vec!["Team", "Members", "Tasks", "Done"]);
    for team in &state.teams {
        let done = team
            .tasks
            .iter()
            .filter(|t| t.status.as_deref() == Some("completed"))
            .count();
        teams.add_row(vec![
            Cell::new(&team.name),
            Cell::new(team.members.len()),
            Cell::new(team.tasks.len()),
            Cell::new(done),
        ]);
    }

    let mut inboxes = table(vec!["Team", "Agent", "Messages", "Unread"]);
    for (team, agents) in &state.inboxes {
        for (agent, messages) in agents {
            inboxes.add_row(vec![
                Cell::new(team),
                Cell::new(agent),
                Cell::new(messages.len()),
                Cell::new(messages.iter().filter(|m| !m.read).count()),
            ]);
        }
    }

    let mut out = teams.to_string();
    if let Some(stats) = &state.stats {
        let field = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "\nTeams: {}  Agents: {}  Tasks: {} ({} completed)",
            field(stats.total_teams),
            field(stats.total_agents),
            field(stats.total_tasks),
            field(stats.completed_tasks),
        ));
    }
    out.push('\n');
    out.push_str(&inboxes.to_string());
    out.push_str(&format!(
        "\nHistory: {} teams  Agent outputs: {}",
        state.team_history.len(),
        state.agent_outputs.len()
    ));
    out
}

/// Format notifications as a table.
pub fn format_notifications_table(records: &[NotificationRecord]) -> String {
    let mut table = table(vec!["", "When", "Type", "Title", "Message", "Id"]);
    for r in records {
        let marker = if r.read { " ".to_string() } else { "●".cyan().to_string() };
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(r.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(r.kind),
            Cell::new(&r.title),
            Cell::new(&r.message),
            Cell::new(r.id),
        ]);
    }
    table.to_string()
}

/// Pretty JSON for any serializable value.
pub fn format_json<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
