//! teamwatch - live monitoring client for autonomous agent teams
//!
//! This library provides the real-time synchronization core: a push-channel
//! connection manager with backoff reconnects, the typed event applier and
//! state store, a staleness-driven REST fallback poller, and the
//! deduplicating notification projections built on the same event stream.

pub mod cli;
pub mod config;
pub mod connection;
pub mod logging;
pub mod notify;
pub mod poller;
pub mod protocol;
pub mod session;
pub mod store;
