//! Configuration parsing, validation, and environment overrides.
//!
//! Configuration is optional: every field has a default, so the binary
//! runs without a file. Precedence, lowest to highest: built-in defaults,
//! TOML file, the [`SERVER_ENV`] environment variable, then command-line
//! flags applied by the caller.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::{AppError, Result};

/// Environment variable overriding the daemon address.
pub const SERVER_ENV: &str = "GFXTAP_SERVER";

/// Daemon connection settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Address of the capture daemon, `host:port`.
    #[serde(default = "default_server_address")]
    pub address: String,
    /// TCP connect timeout.
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_server_address(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
        }
    }
}

fn default_server_address() -> String {
    "127.0.0.1:40000".into()
}

fn default_connect_timeout_seconds() -> u64 {
    15
}

/// Capture session pacing.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CaptureConfig {
    /// Delay between retryable status polls.
    #[serde(default = "default_status_interval_seconds")]
    pub status_interval_seconds: u64,
    /// Bound on the best-effort dispose notification send.
    #[serde(default = "default_dispose_grace_millis")]
    pub dispose_grace_millis: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            status_interval_seconds: default_status_interval_seconds(),
            dispose_grace_millis: default_dispose_grace_millis(),
        }
    }
}

fn default_status_interval_seconds() -> u64 {
    3
}

fn default_dispose_grace_millis() -> u64 {
    500
}

/// Global configuration parsed from the optional TOML file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Daemon connection settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Capture session pacing.
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the [`SERVER_ENV`] override, when set.
    pub fn apply_env_override(&mut self) {
        if let Ok(address) = env::var(SERVER_ENV) {
            if !address.is_empty() {
                debug!(%address, "daemon address overridden from {SERVER_ENV}");
                self.server.address = address;
            }
        }
    }

    /// TCP connect timeout as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.server.connect_timeout_seconds)
    }

    /// Delay between retryable status polls as a [`Duration`].
    #[must_use]
    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.capture.status_interval_seconds)
    }

    /// Dispose notification bound as a [`Duration`].
    #[must_use]
    pub fn dispose_grace(&self) -> Duration {
        Duration::from_millis(self.capture.dispose_grace_millis)
    }

    fn validate(&self) -> Result<()> {
        if self.server.address.trim().is_empty() {
            return Err(AppError::Config("server.address must not be empty".into()));
        }

        if self.server.connect_timeout_seconds == 0 {
            return Err(AppError::Config(
                "server.connect_timeout_seconds must be greater than zero".into(),
            ));
        }

        if self.capture.status_interval_seconds == 0 {
            return Err(AppError::Config(
                "capture.status_interval_seconds must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
