//! Launcher configuration.

use std::time::Duration;

use pgate_core::WindowFeatures;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LaunchError, LaunchResult};

/// Popup target and lifetime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopupConfig {
    /// Base URL the popup path is resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Seconds after which an open popup is forgotten. Default: 120.
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: u64,
    /// Window geometry.
    #[serde(default)]
    pub window: WindowFeatures,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_expiry_secs() -> u64 {
    120
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            expiry_secs: default_expiry_secs(),
            window: WindowFeatures::default(),
        }
    }
}

impl PopupConfig {
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }

    /// Parse the base URL.
    pub fn parsed_base_url(&self) -> LaunchResult<Url> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            LaunchError::InvalidConfig(format!("popup.base_url {:?}: {e}", self.base_url))
        })?;
        if url.cannot_be_a_base() {
            return Err(LaunchError::InvalidConfig(format!(
                "popup.base_url {:?} cannot be a base URL",
                self.base_url
            )));
        }
        Ok(url)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> LaunchResult<()> {
        self.parsed_base_url()?;
        if self.expiry_secs == 0 {
            return Err(LaunchError::InvalidConfig(
                "popup.expiry_secs must be positive".to_string(),
            ));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(LaunchError::InvalidConfig(
                "popup.window width and height must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// How popup windows are opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenerKind {
    /// Spawn an external program with the popup URL.
    #[default]
    Command,
    /// Log the popup URL without opening anything.
    Log,
    /// Popups disabled: every open reports a blocked popup.
    Disabled,
}

/// Window opener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenerConfig {
    #[serde(default)]
    pub kind: OpenerKind,
    /// Program used by the command opener.
    #[serde(default = "default_program")]
    pub program: String,
    /// Extra arguments placed before the popup URL.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_program() -> String {
    "xdg-open".to_string()
}

impl Default for OpenerConfig {
    fn default() -> Self {
        Self {
            kind: OpenerKind::default(),
            program: default_program(),
            args: Vec::new(),
        }
    }
}
