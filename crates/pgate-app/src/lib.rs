//! Trade popup gate service.
//!
//! Wires the components together:
//! - Popup launcher with the configured window opener
//! - Completion listener posting to the backend
//! - Session actor owning the popup registry
//! - HTTP/WebSocket host

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::{AppConfig, SessionConfig};
pub use error::{AppError, AppResult};
