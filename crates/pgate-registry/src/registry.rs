//! Open popup set and active trade marker.
//!
//! The registry is a plain struct mutated through `&mut self`. It is owned by
//! the session actor, which runs every mutation as a single turn, so no
//! locking is needed.
//!
//! Open popup membership is a conservative approximation: an entry is
//! removed on completion or when its expiry fires, not when the window
//! actually goes away.

use std::collections::HashSet;

use pgate_core::ActiveTrade;
use serde::Serialize;
use tracing::trace;

/// Registry of open popups and the active trade.
#[derive(Debug, Default)]
pub struct PopupRegistry {
    open_popups: HashSet<String>,
    active: Option<ActiveTrade>,
}

/// Point-in-time view of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    /// Symbols with a popup presumed open, sorted.
    pub open_popups: Vec<String>,
    /// Active trade, if any.
    pub active_trade: Option<ActiveTrade>,
}

impl PopupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a popup is presumed open for `symbol`.
    pub fn is_open(&self, symbol: &str) -> bool {
        self.open_popups.contains(symbol)
    }

    /// Record a popup as open. Idempotent.
    pub fn mark_open(&mut self, symbol: &str) {
        if self.open_popups.insert(symbol.to_string()) {
            trace!(symbol, "Popup marked open");
        }
    }

    /// Forget a popup. Idempotent; returns whether the symbol was present.
    pub fn mark_closed(&mut self, symbol: &str) -> bool {
        let removed = self.open_popups.remove(symbol);
        if removed {
            trace!(symbol, "Popup marked closed");
        }
        removed
    }

    /// Set the active trade, replacing any previous one.
    pub fn set_active(&mut self, symbol: &str, exchange: &str) {
        self.active = Some(ActiveTrade::new(symbol, exchange));
    }

    /// Clear the active trade only if it is for `symbol`.
    ///
    /// Returns whether the active trade was cleared.
    pub fn clear_active_if_matches(&mut self, symbol: &str) -> bool {
        match &self.active {
            Some(active) if active.symbol == symbol => {
                self.active = None;
                true
            }
            _ => false,
        }
    }

    /// Check whether the active trade is on `exchange`.
    ///
    /// An active trade without an exchange never blocks.
    pub fn is_exchange_busy(&self, exchange: &str) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.exchange.is_empty() && active.exchange == exchange)
    }

    pub fn active(&self) -> Option<&ActiveTrade> {
        self.active.as_ref()
    }

    pub fn open_count(&self) -> usize {
        self.open_popups.len()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut open_popups: Vec<String> = self.open_popups.iter().cloned().collect();
        open_popups.sort();
        RegistrySnapshot {
            open_popups,
            active_trade: self.active.clone(),
        }
    }
}
