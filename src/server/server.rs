//! Static asset server implementation
//!
//! Provides a lifecycle-managed HTTP server for a pre-built frontend:
//! - Strict Stopped -> Starting -> Running -> Stopping -> Stopped transitions
//! - Port-conflict recovery: one bounded retry after a grace period
//! - Serving loop on a background task; the caller is never blocked
//! - Idempotent, double-close-safe shutdown with a bounded drain

use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    http::Method,
    middleware,
    routing::get,
    Router,
};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use super::config::ServerConfig;
use super::error::ServerError;
use super::routes::{response_policy_middleware, serve_asset, serve_index, AssetState};

/// Lifecycle status of the asset server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    /// Not serving, no resources held
    Stopped,
    /// Checking assets and binding the listener
    Starting,
    /// Listener bound, serving loop live
    Running,
    /// Draining in-flight requests and releasing the listener
    Stopping,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerStatus::Stopped => write!(f, "stopped"),
            ServerStatus::Starting => write!(f, "starting"),
            ServerStatus::Running => write!(f, "running"),
            ServerStatus::Stopping => write!(f, "stopping"),
        }
    }
}

/// Result of a stop request
///
/// Stopping is never fatal; a timed-out drain is reported, not raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The server was not running; nothing to do
    AlreadyStopped,
    /// Drained and joined cleanly
    Stopped,
    /// The drain timeout elapsed; the serve task was aborted and the
    /// listener is presumed released
    DrainTimedOut,
}

/// Static asset server with a lifecycle-managed serving loop
pub struct StaticAssetServer {
    config: ServerConfig,
    status: Arc<Mutex<ServerStatus>>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    serve_task: Mutex<Option<JoinHandle<()>>>,
}

impl StaticAssetServer {
    /// Create a new server; no resources are acquired until `start`
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            status: Arc::new(Mutex::new(ServerStatus::Stopped)),
            shutdown_tx: Mutex::new(None),
            serve_task: Mutex::new(None),
        }
    }

    /// Current lifecycle status
    pub fn status(&self) -> ServerStatus {
        *self.status.lock()
    }

    /// Port the server binds
    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// Directory being served
    pub fn root_dir(&self) -> &Path {
        &self.config.root_dir
    }

    /// URL handed to the frontend launcher
    pub fn local_url(&self) -> String {
        self.config.local_url()
    }

    /// Start serving in the background
    ///
    /// Checks the asset root before touching the port, binds the listener
    /// (retrying once after the configured grace period when the port is
    /// taken), spawns the serving loop, and attempts one best-effort
    /// verification request. Verification failure is logged, not raised.
    pub async fn start(&self) -> Result<(), ServerError> {
        {
            let mut status = self.status.lock();
            if *status != ServerStatus::Stopped {
                return Err(ServerError::AlreadyRunning { status: *status });
            }
            *status = ServerStatus::Starting;
        }

        if let Err(e) = self.check_assets() {
            self.set_status(ServerStatus::Stopped);
            return Err(e);
        }

        // Canonicalized once so the routes' escape checks compare against
        // a stable prefix.
        let root = match tokio::fs::canonicalize(&self.config.root_dir).await {
            Ok(root) => Arc::new(root),
            Err(e) => {
                self.set_status(ServerStatus::Stopped);
                return Err(ServerError::Io(e));
            }
        };

        let listener = match self.bind_listener().await {
            Ok(listener) => listener,
            Err(e) => {
                self.set_status(ServerStatus::Stopped);
                return Err(e);
            }
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let router = self.build_router(root);
        let status = Arc::clone(&self.status);
        let port = self.config.port;

        let serve_task = tokio::spawn(async move {
            let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
                // Resolves on stop() or when the sender is dropped, so
                // teardown happens even if the owner never calls stop.
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                tracing::error!(port, error = %e, "asset server loop failed");
                // The listener is gone; stop reporting Running.
                *status.lock() = ServerStatus::Stopped;
            }
        });

        *self.shutdown_tx.lock() = Some(shutdown_tx);
        *self.serve_task.lock() = Some(serve_task);
        self.set_status(ServerStatus::Running);

        tracing::info!(
            port,
            root = %self.config.root_dir.display(),
            "asset server running"
        );

        if let Err(e) = self.verify_startup().await {
            tracing::warn!(error = %e, "startup verification failed; server may still be usable");
        }

        Ok(())
    }

    /// Stop serving
    ///
    /// Idempotent: stopping an already-stopped server is a no-op. New
    /// connections stop being accepted immediately; in-flight requests get
    /// the configured drain timeout, after which the serve task is aborted
    /// and the call still returns.
    pub async fn stop(&self) -> StopOutcome {
        // Taking the sender is the double-close guard: a second caller
        // finds None and returns without touching the listener.
        let Some(shutdown_tx) = self.shutdown_tx.lock().take() else {
            tracing::debug!("stop requested but server is not running");
            return StopOutcome::AlreadyStopped;
        };

        self.set_status(ServerStatus::Stopping);
        tracing::info!(port = self.config.port, "stopping asset server");

        // The receiver may already be gone if the serve loop died on its own.
        let _ = shutdown_tx.send(());

        let task = self.serve_task.lock().take();
        let outcome = match task {
            Some(mut handle) => {
                match tokio::time::timeout(self.config.options.drain_timeout, &mut handle).await {
                    Ok(joined) => {
                        if let Err(e) = joined {
                            if e.is_panic() {
                                tracing::error!(error = %e, "serve task panicked during shutdown");
                            }
                        }
                        StopOutcome::Stopped
                    }
                    Err(_) => {
                        handle.abort();
                        tracing::warn!(
                            timeout_ms = self.config.options.drain_timeout.as_millis() as u64,
                            "shutdown drain timed out; abandoning serve task"
                        );
                        StopOutcome::DrainTimedOut
                    }
                }
            }
            None => StopOutcome::Stopped,
        };

        self.set_status(ServerStatus::Stopped);
        tracing::info!(port = self.config.port, "asset server stopped");
        outcome
    }

    fn set_status(&self, status: ServerStatus) {
        *self.status.lock() = status;
    }

    /// Root directory and entry point must exist before the port is touched
    fn check_assets(&self) -> Result<(), ServerError> {
        if !self.config.root_dir.is_dir() {
            return Err(ServerError::AssetMissing {
                path: self.config.root_dir.clone(),
            });
        }
        let entry = self.config.entry_point();
        if !entry.is_file() {
            return Err(ServerError::AssetMissing { path: entry });
        }
        Ok(())
    }

    /// Bind on all interfaces, retrying exactly once after the grace period
    async fn bind_listener(&self) -> Result<TcpListener, ServerError> {
        let port = self.config.port;
        match self.try_bind() {
            Ok(listener) => Ok(listener),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                let grace = self.config.options.retry_grace;
                tracing::warn!(
                    port,
                    grace_ms = grace.as_millis() as u64,
                    "port in use, waiting for prior instance to release it"
                );
                tokio::time::sleep(grace).await;
                match self.try_bind() {
                    Ok(listener) => {
                        tracing::info!(port, "port released, bind succeeded on retry");
                        Ok(listener)
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                        Err(ServerError::PortInUse { port })
                    }
                    Err(e) => Err(ServerError::Io(e)),
                }
            }
            Err(e) => Err(ServerError::Io(e)),
        }
    }

    fn try_bind(&self) -> std::io::Result<TcpListener> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let socket = TcpSocket::new_v4()?;
        if self.config.options.reuse_address {
            socket.set_reuseaddr(true)?;
        }
        socket.bind(addr)?;
        socket.listen(1024)
    }

    /// Build the router with routes and middleware
    fn build_router(&self, root: Arc<std::path::PathBuf>) -> Router {
        let state = AssetState {
            root,
            no_cache: self.config.options.no_cache,
            verbose: self.config.options.verbose,
        };

        let mut router = Router::new()
            .route("/", get(serve_index))
            .route("/*path", get(serve_asset))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                response_policy_middleware,
            ))
            .with_state(state);

        if self.config.options.cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
                    .allow_headers(Any),
            );
        }

        router
    }

    /// Best-effort GET of the entry point within a bounded timeout
    async fn verify_startup(&self) -> Result<(), ServerError> {
        let url = self.config.verify_url();
        let client = reqwest::Client::builder()
            .timeout(self.config.options.verify_timeout)
            .build()
            .map_err(|e| ServerError::VerificationFailed {
                reason: e.to_string(),
            })?;

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| ServerError::VerificationFailed {
                reason: e.to_string(),
            })?;

        if response.status().is_success() {
            tracing::debug!(url, "startup verification succeeded");
            Ok(())
        } else {
            Err(ServerError::VerificationFailed {
                reason: format!("unexpected status {}", response.status()),
            })
        }
    }
}
