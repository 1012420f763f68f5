//! Event identity keys and the bounded recency set.

use crate::protocol::Event;
use serde_json::{json, Value};
use std::collections::{HashSet, VecDeque};

/// Default number of fingerprints remembered.
pub const DEFAULT_CAPACITY: usize = 500;

/// Stable identity of an event: canonical JSON of `{type, ts, team}`.
///
/// Missing fields serialize as `null`, so two frames of the same type
/// without timestamp or team share a fingerprint.
pub fn fingerprint(event: &Event) -> String {
    fingerprint_parts(event.kind(), event.timestamp(), event.team_name())
}

/// Fingerprint from raw parts; used for synthetic events such as connection changes.
pub fn fingerprint_parts(kind: &str, ts: Option<&Value>, team: Option<&str>) -> String {
    // serde_json maps are key-ordered, which makes the output canonical
    json!({ "type": kind, "ts": ts, "team": team }).to_string()
}

/// Insertion-ordered set capped at `capacity`.
///
/// When an insert pushes it over capacity, only the most recent
/// `capacity / 2` fingerprints are kept.
#[derive(Debug, Clone)]
pub struct FingerprintSet {
    order: VecDeque<String>,
    members: HashSet<String>,
    capacity: usize,
}

impl FingerprintSet {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            order: VecDeque::with_capacity(capacity + 1),
            members: HashSet::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.members.contains(fingerprint)
    }

    /// Insert a fingerprint. Returns `false` if it was already present.
    pub fn insert(&mut self, fingerprint: String) -> bool {
        if self.members.contains(&fingerprint) {
            return false;
        }
        self.members.insert(fingerprint.clone());
        self.order.push_back(fingerprint);

        if self.order.len() > self.capacity {
            let keep = self.capacity / 2;
            let evicted = self.order.len() - keep;
            for old in self.order.drain(..evicted) {
                self.members.remove(&old);
            }
            tracing::trace!(evicted, kept = keep, "Trimmed fingerprint set");
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for FingerprintSet {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
