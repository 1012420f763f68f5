//! CLI module for teamwatch
//!
//! Command-line interface definitions and handlers for the monitoring client.
//!
//! # Commands
//!
//! - `watch` - Follow a server live, printing status and notifications
//! - `snapshot` - One-shot pull of teams, inboxes and agent outputs
//! - `notifications` - Inspect or edit the persisted notification log
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Follow the default local server
//! TEAMWATCH_TOKEN=secret teamwatch watch
//!
//! # Dump current server state as JSON
//! teamwatch snapshot --json
//!
//! # Generate shell completions
//! teamwatch completions bash > ~/.bash_completion.d/teamwatch
//! ```

pub mod completions;
pub mod config;
pub mod notifications;
pub mod output;
pub mod snapshot;
pub mod watch;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::config::TeamwatchConfig;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Load the config file if it exists (defaults otherwise) and apply env overrides.
pub fn load_config(path: &Path) -> Result<TeamwatchConfig, Box<dyn std::error::Error>> {
    let config = if path.exists() {
        TeamwatchConfig::load(Some(path))?
    } else {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        TeamwatchConfig::default()
    };
    Ok(config.with_env_overrides())
}

/// teamwatch - live monitor for agent teams
#[derive(Parser, Debug)]
#[command(
    name = "teamwatch",
    version,
    about = "Live monitoring client for autonomous agent teams"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow a server live
    Watch(WatchArgs),
    /// Pull the current server state once
    Snapshot(SnapshotArgs),
    /// Manage the persisted notification log
    #[command(subcommand)]
    Notifications(NotificationsCommands),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "teamwatch.toml")]
    pub config: PathBuf,

    /// Override the push channel URL (ws:// or wss://)
    #[arg(short, long)]
    pub url: Option<String>,

    /// Override the REST base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Bearer token (prefer TEAMWATCH_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Disable the fallback poller
    #[arg(long)]
    pub no_poller: bool,

    /// Print notifications as JSON lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "teamwatch.toml")]
    pub config: PathBuf,

    /// Override the REST base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Bearer token (prefer TEAMWATCH_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum NotificationsCommands {
    /// List persisted notifications, newest first
    List(NotificationsListArgs),
    /// Mark one or all notifications read
    MarkRead(MarkReadArgs),
    /// Delete every persisted notification
    Clear(NotificationsClearArgs),
}

#[derive(Args, Debug)]
pub struct NotificationsListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Only show unread notifications
    #[arg(long)]
    pub unread: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "teamwatch.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct MarkReadArgs {
    /// Notification id
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub id: Option<String>,

    /// Mark every notification read
    #[arg(long)]
    pub all: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "teamwatch.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct NotificationsClearArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "teamwatch.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "teamwatch.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
