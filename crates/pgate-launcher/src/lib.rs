//! Trade popup launching.
//!
//! Decides whether an incoming signal may open a popup, opens it through a
//! `WindowOpener`, and schedules the popup's expiry from the registry.
//!
//! Gating order for each signal:
//! 1. Exchange busy (another trade active on the same exchange) -> reject
//! 2. Popup already open for the symbol -> reject
//! 3. Open the popup window
//! 4. No window (blocked) or open failure -> alert, registry untouched
//! 5. Mark open, set active, schedule expiry

pub mod alert;
pub mod config;
pub mod error;
pub mod expiry;
pub mod launcher;
pub mod opener;

pub use alert::{AlertSink, LogAlertSink, RecordingAlertSink};
pub use config::{OpenerConfig, OpenerKind, PopupConfig};
pub use error::{LaunchError, LaunchResult, OpenerError};
pub use expiry::{ExpiryScheduler, RecordingScheduler};
pub use launcher::{LaunchOutcome, PopupLauncher, RejectReason};
pub use opener::{
    build_opener, CommandOpener, DisabledOpener, LogOpener, MockOpenBehavior, MockWindowOpener,
    WindowHandle, WindowOpener,
};
