//! REST client for the pull endpoints.

use super::error::ApiError;
use crate::connection::Credentials;
use crate::protocol::{AgentOutput, AgentOutputsResponse, InboxesResponse, RawInboxes, TeamsSnapshot};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::broadcast;
use url::Url;

pub const TEAMS_PATH: &str = "/api/teams";
pub const INBOXES_PATH: &str = "/api/inboxes";
pub const AGENT_OUTPUTS_PATH: &str = "/api/agent-outputs";

/// Out-of-band authentication events. The core never re-authenticates;
/// whoever owns token acquisition listens for these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSignal {
    Unauthorized,
}

/// Source of pull snapshots for the fallback poller.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_teams(&self) -> Result<TeamsSnapshot, ApiError>;
}

/// HTTP client for `/api/teams`, `/api/inboxes` and `/api/agent-outputs`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
    credentials: Credentials,
    auth_tx: broadcast::Sender<AuthSignal>,
}

impl ApiClient {
    /// Create a client with its own connection pool and request timeout.
    pub fn new(
        api_url: &str,
        timeout: Duration,
        credentials: Credentials,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(api_url, client, credentials)
    }

    /// Create a client around an existing `reqwest::Client` (for testing).
    pub fn with_client(
        api_url: &str,
        client: reqwest::Client,
        credentials: Credentials,
    ) -> Result<Self, ApiError> {
        let base = Url::parse(api_url).map_err(|e| ApiError::InvalidUrl {
            url: api_url.to_string(),
            message: e.to_string(),
        })?;
        let (auth_tx, _) = broadcast::channel(16);

        Ok(Self {
            base,
            client,
            credentials,
            auth_tx,
        })
    }

    /// Subscribe to authentication signals raised by any request.
    pub fn auth_signals(&self) -> broadcast::Receiver<AuthSignal> {
        self.auth_tx.subscribe()
    }

    pub async fn fetch_inboxes(&self) -> Result<RawInboxes, ApiError> {
        let response: InboxesResponse = self.get_json(INBOXES_PATH).await?;
        Ok(response.inboxes)
    }

    pub async fn fetch_agent_outputs(&self) -> Result<Vec<AgentOutput>, ApiError> {
        let response: AgentOutputsResponse = self.get_json(AGENT_OUTPUTS_PATH).await?;
        Ok(response.outputs)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(|e| ApiError::InvalidUrl {
            url: format!("{}{}", self.base, path),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let mut request = self.client.get(url);
        if let Some(token) = self.credentials.token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(path, "Pull request unauthorized");
            // No subscribers is fine: nobody is listening for re-auth
            let _ = self.auth_tx.send(AuthSignal::Unauthorized);
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Http(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SnapshotSource for ApiClient {
    async fn fetch_teams(&self) -> Result<TeamsSnapshot, ApiError> {
        self.get_json(TEAMS_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base() {
        let client = ApiClient::new(
            "http://localhost:3001",
            Duration::from_secs(1),
            Credentials::default(),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(TEAMS_PATH).unwrap().as_str(),
            "http://localhost:3001/api/teams"
        );
    }

    #[test]
    fn test_rejects_invalid_base() {
        let err = ApiClient::new("not a url", Duration::from_secs(1), Credentials::default())
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl { .. }));
    }
}
