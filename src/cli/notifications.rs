//! Notification log commands
//!
//! These operate on the persisted log only; they never contact the server.

use crate::cli::output::{format_json, format_notifications_table};
use crate::cli::{load_config, MarkReadArgs, NotificationsClearArgs, NotificationsListArgs};
use crate::notify::{FileNotificationStore, NotificationLog, NotificationStore};
use std::path::Path;
use uuid::Uuid;

fn open_store(config_path: &Path) -> Result<(FileNotificationStore, usize), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let dir = config.notifications.store_dir.ok_or(
        "No notification store configured. Set [notifications] store_dir or TEAMWATCH_STORE_DIR.",
    )?;
    Ok((FileNotificationStore::new(dir), config.notifications.max_entries))
}

fn open_log(config_path: &Path) -> Result<(FileNotificationStore, NotificationLog), Box<dyn std::error::Error>> {
    let (store, max_entries) = open_store(config_path)?;
    let log = NotificationLog::from_records(store.load(), max_entries);
    Ok((store, log))
}

/// Handle `teamwatch notifications list`
pub fn handle_list(args: &NotificationsListArgs) -> Result<String, Box<dyn std::error::Error>> {
    let (_, log) = open_log(&args.config)?;
    let records: Vec<_> = log
        .list()
        .into_iter()
        .filter(|r| !args.unread || !r.read)
        .collect();

    if args.json {
        return Ok(format_json(&records)?);
    }
    if records.is_empty() {
        return Ok("No notifications.".to_string());
    }
    Ok(format!(
        "{}\n{} unread of {}",
        format_notifications_table(&records),
        log.unread_count(),
        log.len()
    ))
}

/// Handle `teamwatch notifications mark-read`
pub fn handle_mark_read(args: &MarkReadArgs) -> Result<String, Box<dyn std::error::Error>> {
    let (store, mut log) = open_log(&args.config)?;

    let message = if args.all {
        let changed = log.mark_all_read();
        format!("Marked {} notification(s) read", changed)
    } else {
        let raw = args.id.as_deref().ok_or("Missing notification id")?;
        let id = Uuid::parse_str(raw).map_err(|e| format!("Invalid notification id '{}': {}", raw, e))?;
        if !log.mark_read(id) {
            return Err(format!("Notification not found: {}", id).into());
        }
        format!("Marked {} read", id)
    };

    store.save(&log.list())?;
    Ok(message)
}

/// Handle `teamwatch notifications clear`
pub fn handle_clear(args: &NotificationsClearArgs) -> Result<String, Box<dyn std::error::Error>> {
    let (store, mut log) = open_log(&args.config)?;
    let removed = log.len();
    log.clear();
    store.save(&log.list())?;
    Ok(format!("Removed {} notification(s)", removed))
}
