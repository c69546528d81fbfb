//! API and WebSocket message types.

use pgate_launcher::RejectReason;
use pgate_registry::RegistrySnapshot;
use pgate_session::SessionEvent;
use serde::Serialize;

/// Message pushed to WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GateMessage {
    /// Registry state (sent on connect).
    Snapshot(RegistrySnapshot),
    /// Session event.
    Event(SessionEvent),
    /// Alert the user must see.
    Alert { message: String, timestamp_ms: i64 },
}

/// Response of `POST /api/signal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LaunchResponse {
    Opened { symbol: String, window_id: String },
    Rejected { reason: RejectReason },
    Failed { kind: String, message: String },
}

/// Response of `POST /api/events`.
#[derive(Debug, Clone, Serialize)]
pub struct EventResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// Response of `POST /api/trade-completed`.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedResponse {
    pub success: bool,
    pub message: &'static str,
}
