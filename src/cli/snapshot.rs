//! Snapshot command implementation

use crate::cli::output::{format_json, format_snapshot_tables};
use crate::cli::{load_config, SnapshotArgs};
use crate::connection::Credentials;
use crate::poller::{ApiClient, SnapshotSource};
use crate::store::{sanitize_inboxes, StateStore};
use std::time::Duration;

/// Pull all three endpoints and assemble them into one state value.
pub async fn fetch_state(client: &ApiClient) -> Result<StateStore, Box<dyn std::error::Error>> {
    let (teams, inboxes, outputs) = tokio::try_join!(
        client.fetch_teams(),
        client.fetch_inboxes(),
        client.fetch_agent_outputs()
    )?;

    Ok(StateStore {
        teams: teams.teams,
        stats: teams.stats,
        team_history: teams.team_history,
        agent_outputs: outputs,
        inboxes: sanitize_inboxes(inboxes),
    })
}

/// Handle `teamwatch snapshot` command
pub async fn run_snapshot(args: SnapshotArgs) -> Result<String, Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;
    if let Some(ref api_url) = args.api_url {
        config.connection.api_url = api_url.clone();
    }
    if let Some(ref token) = args.token {
        config.connection.token = Some(token.clone());
    }
    config.validate()?;

    let client = ApiClient::new(
        &config.connection.api_url,
        Duration::from_secs(config.poller.timeout_seconds),
        Credentials::new(config.connection.token.clone()),
    )?;

    let state = fetch_state(&client).await?;
    tracing::debug!(teams = state.teams.len(), "Snapshot fetched");

    if args.json {
        Ok(format_json(&state)?)
    } else {
        Ok(format_snapshot_tables(&state))
    }
}
