//! Session-scoped credential store.
//!
//! Token acquisition happens elsewhere; this only holds the current token and
//! lets the connection manager and the REST client observe changes.

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct Credentials {
    tx: watch::Sender<Option<String>>,
}

impl Credentials {
    pub fn new(token: Option<String>) -> Self {
        let (tx, _rx) = watch::channel(token.filter(|t| !t.is_empty()));
        Self { tx }
    }

    /// Current token, if any.
    pub fn token(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    pub fn has_token(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Store a new token. Empty strings clear the store.
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        let next = if token.is_empty() { None } else { Some(token) };
        self.tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    pub fn clear(&self) {
        self.tx.send_if_modified(|current| current.take().is_some());
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(None)
    }
}
