//! Prometheus metrics and structured logging for the trade popup gate.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters for popup launches, rejections, expiries and
//!   completions, rendered for the `/metrics` endpoint

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::{render_metrics, Metrics};
