//! Static Asset Server
//!
//! This module provides a lifecycle-managed localhost HTTP server for a
//! pre-built single-page frontend:
//! - Strict Stopped -> Starting -> Running -> Stopping -> Stopped lifecycle
//! - Port-conflict recovery (one bounded retry after a grace period)
//! - Explicit directory-escape protection on every request
//! - Idempotent shutdown with a bounded drain and join

mod config;
mod error;
mod routes;
mod server;

#[cfg(test)]
mod tests;

pub use config::{
    ServerConfig, ServerOptions, DEFAULT_DRAIN_TIMEOUT, DEFAULT_RETRY_GRACE, DEFAULT_SERVER_PORT,
    DEFAULT_VERIFY_TIMEOUT,
};
pub use error::ServerError;
pub use server::{ServerStatus, StaticAssetServer, StopOutcome};
