//! Validated keys for the inbox map.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

/// Names that must never become inbox keys.
pub const RESERVED_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("inbox key is empty")]
    Empty,

    #[error("inbox key '{0}' is reserved")]
    Reserved(String),
}

/// A team or agent name that is safe to use as an inbox map key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InboxKey(String);

impl InboxKey {
    pub fn new(raw: &str) -> Result<Self, KeyError> {
        if raw.is_empty() {
            return Err(KeyError::Empty);
        }
        if RESERVED_KEYS.contains(&raw) {
            return Err(KeyError::Reserved(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validate a raw key, returning `None` for rejected names.
pub fn sanitize(raw: &str) -> Option<InboxKey> {
    InboxKey::new(raw).ok()
}

impl TryFrom<String> for InboxKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<InboxKey> for String {
    fn from(key: InboxKey) -> Self {
        key.0
    }
}

impl Borrow<str> for InboxKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InboxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
