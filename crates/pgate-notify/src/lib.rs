//! Trade completion handling.
//!
//! When a popup reports `TRADE_CLOSED`, the listener releases the popup's
//! registry entries and forwards the event to the backend. Delivery runs in
//! its own task and is never awaited by the listener; its outcome is
//! published on an optional report channel.

pub mod config;
pub mod error;
pub mod listener;
pub mod notifier;

pub use config::NotifyConfig;
pub use error::{NotifyError, NotifyResult};
pub use listener::{CompletionListener, CompletionOutcome, NotificationReport};
pub use notifier::{BoxFuture, CompletionNotifier, HttpNotifier, MockNotifier, COMPLETION_PATH};
