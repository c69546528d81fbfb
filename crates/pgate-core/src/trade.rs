//! Active trade marker.

use serde::{Deserialize, Serialize};

/// The single in-flight trade considered to be blocking further trades on
/// its exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTrade {
    pub symbol: String,
    pub exchange: String,
}

impl ActiveTrade {
    pub fn new(symbol: impl Into<String>, exchange: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: exchange.into(),
        }
    }
}

impl std::fmt::Display for ActiveTrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.symbol, self.exchange)
    }
}
