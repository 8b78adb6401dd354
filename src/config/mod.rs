//! Application Configuration
//!
//! Provides JSON file-based configuration with:
//! - Generated defaults when no file exists
//! - Validation on load
//! - Environment overrides for the CLI wrapper

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::server::{ServerConfig, ServerOptions, DEFAULT_SERVER_PORT};


/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_asset_root() -> PathBuf {
    PathBuf::from("frontend/build")
}

fn default_port() -> u16 {
    DEFAULT_SERVER_PORT
}

fn default_true() -> bool {
    true
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the pre-built frontend (must contain index.html)
    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,

    /// Port the asset server binds
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow immediate rebind after close
    #[serde(default = "default_true")]
    pub reuse_address: bool,

    /// Emit permissive cross-origin headers
    #[serde(default = "default_true")]
    pub cors: bool,

    /// Force revalidation on every request
    #[serde(default = "default_true")]
    pub no_cache: bool,

    /// Log every request
    #[serde(default)]
    pub verbose: bool,

    /// Browser programs tried in kiosk mode before the built-in chain
    #[serde(default)]
    pub extra_browsers: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            asset_root: default_asset_root(),
            port: default_port(),
            reuse_address: true,
            cors: true,
            no_cache: true,
            verbose: false,
            extra_browsers: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Default configuration file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kiosk-shell")
            .join("config.json")
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::info!(path = %path.display(), "loading configuration");
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "configuration file absent, using defaults");
            Ok(Self::default())
        }
    }

    /// Apply `KIOSK_PORT` and `KIOSK_ASSET_ROOT` environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("KIOSK_PORT") {
            match value.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!(value = %value, "ignoring unparseable KIOSK_PORT"),
            }
        }
        if let Ok(value) = env::var("KIOSK_ASSET_ROOT") {
            self.asset_root = PathBuf::from(value);
        }
    }

    /// Validate field ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::Invalid(
                "port must be non-zero so the frontend URL is known up front".to_string(),
            ));
        }
        if self.asset_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "asset_root must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Asset server configuration derived from this app configuration
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(self.asset_root.clone(), self.port).with_options(ServerOptions {
            reuse_address: self.reuse_address,
            cors: self.cors,
            no_cache: self.no_cache,
            verbose: self.verbose,
            ..ServerOptions::default()
        })
    }
}
