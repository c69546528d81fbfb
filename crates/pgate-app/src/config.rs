//! Application configuration.

use pgate_launcher::{OpenerConfig, OpenerKind, PopupConfig};
use pgate_notify::NotifyConfig;
use pgate_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppError, AppResult};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PGATE_CONFIG";

/// Config file used when neither `--config` nor `PGATE_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Session actor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session message channel capacity. Default: 256.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub popup: PopupConfig,
    #[serde(default)]
    pub opener: OpenerConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load from `PGATE_CONFIG` or the default path, falling back to
    /// defaults if the file does not exist.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        if Path::new(&config_path).exists() {
            tracing::info!(config_path = %config_path, "Loading configuration");
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    /// Parse from TOML text.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Validate all sections.
    pub fn validate(&self) -> AppResult<()> {
        self.popup.validate()?;

        self.server
            .bind_addr()
            .map_err(|e| AppError::Config(format!("server.host {:?}: {e}", self.server.host)))?;

        if self.server.max_connections == 0 {
            return Err(AppError::Config(
                "server.max_connections must be positive".to_string(),
            ));
        }

        if self.session.channel_capacity == 0 {
            return Err(AppError::Config(
                "session.channel_capacity must be positive".to_string(),
            ));
        }

        if self.opener.kind == OpenerKind::Command && self.opener.program.trim().is_empty() {
            return Err(AppError::Config(
                "opener.program is required for the command opener".to_string(),
            ));
        }

        if self.notify.timeout_ms == 0 {
            return Err(AppError::Config(
                "notify.timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
