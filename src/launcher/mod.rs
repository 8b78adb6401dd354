//! Frontend Launcher
//!
//! Presents the served frontend URL by trying an ordered list of launch
//! strategies; the first strategy whose process spawns wins. A launch is
//! only attempted against a server that reports Running, and each launch
//! produces a [`LaunchAttempt`] record owning the spawned process.

mod attempt;
mod strategy;


pub use attempt::LaunchAttempt;
pub use strategy::{default_strategies, LaunchStrategy};

use thiserror::Error;

use crate::server::{ServerStatus, StaticAssetServer};

/// Launcher error type
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Cannot launch frontend: server is {status}, not running")]
    ServerNotRunning { status: ServerStatus },

    #[error("All launch strategies failed: {}", tried.join(", "))]
    AllStrategiesFailed { tried: Vec<String> },
}

/// Ordered launch-strategy chain
pub struct BrowserLauncher {
    strategies: Vec<LaunchStrategy>,
}

impl Default for BrowserLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserLauncher {
    /// Launcher with the default strategy chain
    pub fn new() -> Self {
        Self {
            strategies: default_strategies(),
        }
    }

    /// Launcher with a custom strategy chain
    pub fn with_strategies(strategies: Vec<LaunchStrategy>) -> Self {
        Self { strategies }
    }

    /// The strategies that will be tried, in order
    pub fn strategies(&self) -> &[LaunchStrategy] {
        &self.strategies
    }

    /// Try each strategy in order against a running server
    ///
    /// The first successful spawn wins; a strategy whose program is not
    /// installed is skipped with a debug log.
    pub fn launch(&self, server: &StaticAssetServer) -> Result<LaunchAttempt, LaunchError> {
        let status = server.status();
        if status != ServerStatus::Running {
            return Err(LaunchError::ServerNotRunning { status });
        }

        let url = server.local_url();
        let mut tried = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            match strategy.command(&url).spawn() {
                Ok(child) => {
                    tracing::info!(
                        strategy = %strategy.name,
                        url = %url,
                        "frontend launched"
                    );
                    return Ok(LaunchAttempt::new(&strategy.name, &url, child));
                }
                Err(e) => {
                    tracing::debug!(
                        strategy = %strategy.name,
                        error = %e,
                        "launch strategy unavailable"
                    );
                    tried.push(strategy.name.clone());
                }
            }
        }

        Err(LaunchError::AllStrategiesFailed { tried })
    }
}
