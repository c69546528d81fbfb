//! Events published by the session for UI clients.

use pgate_launcher::RejectReason;
use serde::Serialize;

/// Something observable happened in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    PopupOpened {
        symbol: String,
        exchange: String,
        window_id: String,
        timestamp_ms: i64,
    },
    LaunchRejected {
        symbol: String,
        exchange: String,
        reason: RejectReason,
        timestamp_ms: i64,
    },
    LaunchFailed {
        symbol: String,
        kind: String,
        message: String,
        timestamp_ms: i64,
    },
    TradeClosed {
        symbol: String,
        cleared_active: bool,
        timestamp_ms: i64,
    },
    PopupExpired {
        symbol: String,
        timestamp_ms: i64,
    },
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
