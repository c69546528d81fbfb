//! Popup bookkeeping for the trade popup gate.
//!
//! Tracks which symbols currently have a popup presumed open and which single
//! symbol/exchange pair is the active trade.

pub mod registry;

pub use registry::{PopupRegistry, RegistrySnapshot};
