//! pgate-server - HTTP host for the trade popup gate.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                       popup-gate process                       │
//! │                                                               │
//! │  ┌───────────────┐   launch / deliver   ┌──────────────────┐  │
//! │  │ axum handlers │ ───────────────────► │   SessionTask    │  │
//! │  └──────┬────────┘                      │  (PopupRegistry) │  │
//! │         │                               └────────┬─────────┘  │
//! │         │        broadcast<GateMessage>          │            │
//! │         └◄──────── alerts + session events ◄─────┘            │
//! │                                                               │
//! │  POST /api/signal           → launch popup                    │
//! │  POST /api/events           → inbound popup events            │
//! │  POST /api/trade-completed  → backend completion endpoint     │
//! │  GET  /trade-popup-fixed    → popup page                      │
//! │  GET  /api/state            → registry snapshot               │
//! │  GET  /ws                   → live alerts and events          │
//! │  GET  /metrics              → Prometheus exposition           │
//! └───────────────────────────────────────────────────────────────┘
//! ```

mod alert;
mod config;
mod server;
mod types;

pub use alert::BroadcastAlertSink;
pub use config::ServerConfig;
pub use server::{create_router, gate_channel, run_server, AppState};
pub use types::{GateMessage, LaunchResponse};
