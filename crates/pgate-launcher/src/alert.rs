//! User-facing alerts.

use parking_lot::Mutex;
use tracing::warn;

/// Destination for alerts the user must see (popup blocked, open failure).
pub trait AlertSink: Send + Sync {
    fn alert(&self, message: &str);
}

/// Alert sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn alert(&self, message: &str) {
        warn!(alert = message, "User alert");
    }
}

/// Alert sink that records alerts for verification.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<String>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().clone()
    }
}

impl AlertSink for RecordingAlertSink {
    fn alert(&self, message: &str) {
        self.alerts.lock().push(message.to_string());
    }
}
