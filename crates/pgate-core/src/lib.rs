//! Core domain types for the trade popup gate.
//!
//! This crate provides the types shared by every other crate:
//! - `Signal`: Incoming trade recommendation with loosely typed fields
//! - `PopupParams`, `PopupRequest`: Popup target URL and window settings
//! - `ActiveTrade`: The single in-flight trade blocking its exchange
//! - `InboundEvent`: Messages coming back from popup windows

pub mod error;
pub mod event;
pub mod popup;
pub mod signal;
pub mod trade;

pub use error::{CoreError, Result};
pub use event::{InboundEvent, TradeClosed, TRADE_CLOSED};
pub use popup::{
    window_name, PopupParams, PopupRequest, WindowFeatures, POPUP_PATH, WINDOW_NAME_PREFIX,
};
pub use signal::{Signal, DEFAULT_QUANTITY};
pub use trade::ActiveTrade;
