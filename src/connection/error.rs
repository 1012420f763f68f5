//! Connection error types.

use thiserror::Error;

/// Reasons a push-channel target cannot be used or a session ended.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("invalid push URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported push URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("no credentials available")]
    MissingCredentials,

    #[error("transport error: {0}")]
    Transport(String),
}
