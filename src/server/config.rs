//! Asset server configuration types

use std::path::PathBuf;
use std::time::Duration;

/// Default port for the asset server
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default grace period granted to a prior instance before the single bind retry
pub const DEFAULT_RETRY_GRACE: Duration = Duration::from_secs(3);

/// Default bound on the best-effort startup verification request
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(2);

/// Default bound on draining in-flight requests and joining the serve task
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(3);

/// Tunable behavior of the asset server
#[derive(Clone, Debug)]
pub struct ServerOptions {
    /// Set SO_REUSEADDR so the port can be rebound immediately after close
    pub reuse_address: bool,
    /// Emit permissive cross-origin headers
    pub cors: bool,
    /// Emit headers forcing revalidation on every request
    pub no_cache: bool,
    /// Log every request
    pub verbose: bool,
    /// Wait before the single bind retry when the port is already in use
    pub retry_grace: Duration,
    /// Timeout for the post-start verification request
    pub verify_timeout: Duration,
    /// Timeout for draining in-flight requests and joining the serve task
    pub drain_timeout: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            reuse_address: true,
            cors: true,
            no_cache: true,
            verbose: false,
            retry_grace: DEFAULT_RETRY_GRACE,
            verify_timeout: DEFAULT_VERIFY_TIMEOUT,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

/// Asset server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Directory served read-only (must contain the entry point file)
    pub root_dir: PathBuf,
    /// Port to bind on all interfaces
    pub port: u16,
    /// Behavior options
    pub options: ServerOptions,
}

impl ServerConfig {
    /// Create a configuration with default options
    pub fn new(root_dir: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            root_dir: root_dir.into(),
            port,
            options: ServerOptions::default(),
        }
    }

    /// Replace the options
    pub fn with_options(mut self, options: ServerOptions) -> Self {
        self.options = options;
        self
    }

    /// Entry point file served for `/`
    pub fn entry_point(&self) -> PathBuf {
        self.root_dir.join("index.html")
    }

    /// URL handed to the frontend launcher once the server is running
    pub fn local_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// URL probed by the startup verification request
    pub(crate) fn verify_url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }
}
