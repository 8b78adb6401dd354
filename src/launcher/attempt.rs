//! Launch attempt records

use std::process::ExitStatus;
use std::time::Instant;

use tokio::process::Child;
use uuid::Uuid;

/// Ephemeral record of one frontend launch
///
/// An attempt is only ever created against a server that reported Running
/// at launch time; it owns the spawned process for its lifetime.
#[derive(Debug)]
pub struct LaunchAttempt {
    id: Uuid,
    strategy: String,
    url: String,
    child: Child,
    started_at: Instant,
}

impl LaunchAttempt {
    pub(crate) fn new(strategy: &str, url: &str, child: Child) -> Self {
        Self {
            id: Uuid::new_v4(),
            strategy: strategy.to_string(),
            url: url.to_string(),
            child,
            started_at: Instant::now(),
        }
    }

    /// Unique identifier for log correlation
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the strategy that won
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// URL the frontend was launched against
    pub fn url(&self) -> &str {
        &self.url
    }

    /// When the process was spawned
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Wait for the launched process to exit
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Kill the launched process and reap it
    pub async fn terminate(&mut self) -> std::io::Result<()> {
        self.child.kill().await
    }
}
