//! Asset server error types

use std::path::PathBuf;
use thiserror::Error;

use super::server::ServerStatus;

/// Asset server error type
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Asset root or entry point missing: {}", path.display())]
    AssetMissing { path: PathBuf },

    #[error("Port {port} still in use after retry grace period")]
    PortInUse { port: u16 },

    #[error("Server already started (status: {status})")]
    AlreadyRunning { status: ServerStatus },

    #[error("Startup verification failed: {reason}")]
    VerificationFailed { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Check if this error must abort startup
    ///
    /// Non-fatal errors are logged and execution continues.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ServerError::VerificationFailed { .. })
    }
}
