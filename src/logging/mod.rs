//! Logging System
//!
//! Provides structured logging with:
//! - Configurable verbosity levels (overridable via `RUST_LOG`)
//! - Console and daily-rolling file outputs
//! - Non-blocking file writes with guards held for the process lifetime

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging system errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitializationError(String),

    #[error("Failed to create log directory: {0}")]
    DirectoryCreationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for logging operations
pub type LoggingResult<T> = Result<T, LoggingError>;

/// Log verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log output destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Output to console only
    #[default]
    Console,
    /// Output to file only
    File,
    /// Output to both console and file
    Both,
}

/// Main logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global log level (RUST_LOG overrides when set)
    pub level: LogLevel,

    /// Log output destination
    pub output: LogOutput,

    /// Directory for log files (if file output is enabled)
    pub log_directory: Option<PathBuf>,

    /// Prefix of the rolling log file name
    pub file_prefix: String,
}

impl LoggingConfig {
    /// Verbose console-only preset for debug builds
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            output: LogOutput::Console,
            log_directory: None,
            file_prefix: "kiosk-shell".to_string(),
        }
    }

    /// Console plus daily-rolling file preset for release builds
    pub fn production() -> Self {
        Self {
            level: LogLevel::Info,
            output: LogOutput::Both,
            log_directory: Some(default_log_directory()),
            file_prefix: "kiosk-shell".to_string(),
        }
    }
}

fn default_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kiosk-shell")
        .join("logs")
}

/// Global logging system state
///
/// Keep the returned value alive for the duration of the application so
/// the non-blocking file writer is flushed on exit.
pub struct LoggingSystem {
    config: LoggingConfig,
    _guards: Vec<WorkerGuard>,
}

impl LoggingSystem {
    /// Initialize the logging system with the given configuration
    pub fn init(config: LoggingConfig) -> LoggingResult<Self> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

        let mut guards = Vec::new();

        match config.output {
            LogOutput::Console => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_target(true))
                    .try_init()
                    .map_err(|e| LoggingError::InitializationError(e.to_string()))?;
            }
            LogOutput::File => {
                let (writer, guard) = Self::file_writer(&config)?;
                guards.push(guard);
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_ansi(false).with_writer(writer))
                    .try_init()
                    .map_err(|e| LoggingError::InitializationError(e.to_string()))?;
            }
            LogOutput::Both => {
                let (writer, guard) = Self::file_writer(&config)?;
                guards.push(guard);
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_target(true))
                    .with(fmt::layer().with_ansi(false).with_writer(writer))
                    .try_init()
                    .map_err(|e| LoggingError::InitializationError(e.to_string()))?;
            }
        }

        Ok(Self {
            config,
            _guards: guards,
        })
    }

    /// The configuration this system was initialized with
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    fn file_writer(config: &LoggingConfig) -> LoggingResult<(NonBlocking, WorkerGuard)> {
        let directory = config
            .log_directory
            .clone()
            .unwrap_or_else(default_log_directory);

        std::fs::create_dir_all(&directory).map_err(|e| {
            LoggingError::DirectoryCreationError(format!("{}: {}", directory.display(), e))
        })?;

        let appender = RollingFileAppender::new(
            Rotation::DAILY,
            directory,
            format!("{}.log", config.file_prefix),
        );
        Ok(tracing_appender::non_blocking(appender))
    }
}
