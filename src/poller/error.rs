//! Error types for the pull endpoints.

use thiserror::Error;

/// Errors returned by [`super::ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Server rejected the bearer token
    #[error("unauthorized")]
    Unauthorized,

    /// Any other non-success status
    #[error("HTTP error: {0}")]
    Http(u16),

    /// Transport failure or timeout
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Body did not match the expected shape
    #[error("invalid response: {0}")]
    Decode(String),

    /// Base URL could not be joined with an endpoint path
    #[error("invalid API url '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}
