//! Kiosk Shell - launches a pre-built web frontend in a kiosk-style browser
//!
//! This crate provides the core functionality for the kiosk shell including:
//! - Lifecycle-managed static asset server with port-conflict recovery
//! - Ordered browser launch-strategy chain (first success wins)
//! - JSON file configuration with environment overrides
//! - Structured logging with console and rolling-file outputs
//! - Signal adapter for clean teardown

pub mod config;
pub mod launcher;
pub mod logging;
pub mod server;
pub mod shutdown;

// Re-export commonly used items
pub use config::{AppConfig, ConfigError};
pub use launcher::{BrowserLauncher, LaunchAttempt, LaunchError, LaunchStrategy};
pub use server::{
    ServerConfig, ServerError, ServerOptions, ServerStatus, StaticAssetServer, StopOutcome,
};
