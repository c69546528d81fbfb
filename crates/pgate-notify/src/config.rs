//! Notification configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backend notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Base URL of the backend receiving completion events.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Request timeout (ms). Default: 5,000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl NotifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
