//! Popup expiry scheduling.
//!
//! Expiry is a heuristic: the popup is forgotten after a fixed delay whether
//! or not its window is still open. A scheduled expiry cannot be cancelled;
//! firing after the symbol was already removed is a no-op.

use std::time::Duration;

use parking_lot::Mutex;

/// Schedules a deferred `mark_closed` for a symbol.
pub trait ExpiryScheduler: Send + Sync {
    fn schedule(&self, symbol: String, after: Duration);
}

/// Scheduler that records requests instead of running timers.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    scheduled: Mutex<Vec<(String, Duration)>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get recorded `(symbol, delay)` pairs.
    pub fn scheduled(&self) -> Vec<(String, Duration)> {
        self.scheduled.lock().clone()
    }
}

impl ExpiryScheduler for RecordingScheduler {
    fn schedule(&self, symbol: String, after: Duration) {
        self.scheduled.lock().push((symbol, after));
    }
}
