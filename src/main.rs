//! Kiosk Shell - launches a pre-built web frontend in a kiosk-style browser
//!
//! CLI wrapper around the asset server and the launch-strategy chain.
//! Exit codes: 0 for a clean start and clean shutdown, 1 for missing
//! assets, an unrecoverable port conflict, launch exhaustion, or any
//! unexpected failure.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;

use kiosk_shell::config::AppConfig;
use kiosk_shell::launcher::{default_strategies, BrowserLauncher, LaunchStrategy};
use kiosk_shell::logging::{LoggingConfig, LoggingSystem};
use kiosk_shell::server::StaticAssetServer;
use kiosk_shell::shutdown;

#[tokio::main]
async fn main() -> ExitCode {
    let logging_config = if cfg!(debug_assertions) {
        LoggingConfig::development()
    } else {
        LoggingConfig::production()
    };

    // Keep the logging system alive for the duration of the application so
    // the non-blocking file writer is flushed on exit.
    let _logging_system = match LoggingSystem::init(logging_config) {
        Ok(system) => Some(system),
        Err(e) => {
            // Fall back to basic logging if advanced logging fails
            eprintln!("Failed to initialize logging system: {e}. Using basic logging.");
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                )
                .init();
            None
        }
    };

    tracing::info!("Starting kiosk shell...");

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = format!("{e:#}"), "configuration error");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => {
            tracing::info!("Kiosk shell exited cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = format!("{e:#}"), "kiosk shell failed");
            ExitCode::FAILURE
        }
    }
}

/// Load configuration from the optional path argument, the default
/// location, and the environment.
fn load_config() -> anyhow::Result<AppConfig> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(AppConfig::default_path);

    let mut config = AppConfig::load_or_default(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Start the server, present the frontend, and wait for teardown
///
/// The server is stopped on every path after a successful start,
/// including launch failure and signal-driven exits.
async fn run(config: AppConfig) -> anyhow::Result<()> {
    let server = StaticAssetServer::new(config.server_config());
    server
        .start()
        .await
        .context("failed to start asset server")?;

    let result = drive(&server, &config).await;

    let outcome = server.stop().await;
    tracing::info!(?outcome, "asset server stopped");

    result
}

/// Launch the frontend and wait for it to exit or for a signal
async fn drive(server: &StaticAssetServer, config: &AppConfig) -> anyhow::Result<()> {
    let mut strategies: Vec<LaunchStrategy> = config
        .extra_browsers
        .iter()
        .map(|program| LaunchStrategy::kiosk_browser(program))
        .collect();
    strategies.extend(default_strategies());

    let launcher = BrowserLauncher::with_strategies(strategies);
    let mut attempt = launcher
        .launch(server)
        .context("failed to launch the frontend")?;

    tracing::info!(
        attempt = %attempt.id(),
        strategy = attempt.strategy(),
        url = attempt.url(),
        "frontend presented"
    );

    tokio::select! {
        status = attempt.wait() => {
            match status {
                Ok(status) => tracing::info!(exit = %status, "frontend process exited"),
                Err(e) => tracing::warn!(error = %e, "failed to await frontend process"),
            }
        }
        result = shutdown::wait_for_signal() => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "signal listener failed");
            }
            tracing::info!("shutdown signal received");
            if let Err(e) = attempt.terminate().await {
                tracing::warn!(error = %e, "failed to terminate frontend process");
            }
        }
    }

    Ok(())
}
