//! Inbound events from popup windows.
//!
//! Popups report back through a generic event channel. Only `TRADE_CLOSED`
//! is acted upon; the whole payload is kept so it can be forwarded to the
//! backend exactly as received.

use serde_json::Value;

use crate::signal::normalize_value;

/// Event type emitted when a trade popup closes.
pub const TRADE_CLOSED: &str = "TRADE_CLOSED";

/// A parsed inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// A trade popup closed.
    TradeClosed(TradeClosed),
    /// Any other event type (or a payload without a `type`).
    Ignored { kind: Option<String> },
}

/// Completion of a trade popup.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeClosed {
    /// Symbol of the closed popup (empty when the event carried none).
    pub symbol: String,
    /// Full event payload, unmodified.
    pub payload: Value,
}

impl InboundEvent {
    /// Classify a raw event payload.
    pub fn from_value(payload: Value) -> Self {
        let kind = payload.get("type").and_then(Value::as_str);
        if kind != Some(TRADE_CLOSED) {
            return Self::Ignored {
                kind: kind.map(str::to_string),
            };
        }

        let symbol = payload
            .get("symbol")
            .cloned()
            .and_then(normalize_value)
            .unwrap_or_default();

        Self::TradeClosed(TradeClosed { symbol, payload })
    }

    /// Event type label for logging.
    pub fn kind(&self) -> &str {
        match self {
            Self::TradeClosed(_) => TRADE_CLOSED,
            Self::Ignored { kind } => kind.as_deref().unwrap_or("<none>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trade_closed_keeps_payload() {
        let payload = json!({"type": "TRADE_CLOSED", "symbol": "BTCUSD", "pnl": 12.5});
        match InboundEvent::from_value(payload.clone()) {
            InboundEvent::TradeClosed(closed) => {
                assert_eq!(closed.symbol, "BTCUSD");
                assert_eq!(closed.payload, payload);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_other_types_ignored() {
        let event = InboundEvent::from_value(json!({"type": "TRADE_OPENED", "symbol": "BTCUSD"}));
        assert_eq!(
            event,
            InboundEvent::Ignored {
                kind: Some("TRADE_OPENED".to_string())
            }
        );
        assert_eq!(event.kind(), "TRADE_OPENED");
    }

    #[test]
    fn test_missing_type_ignored() {
        let event = InboundEvent::from_value(json!({"symbol": "BTCUSD"}));
        assert_eq!(event, InboundEvent::Ignored { kind: None });
        assert_eq!(event.kind(), "<none>");
    }

    #[test]
    fn test_missing_symbol_is_empty() {
        match InboundEvent::from_value(json!({"type": "TRADE_CLOSED"})) {
            InboundEvent::TradeClosed(closed) => assert_eq!(closed.symbol, ""),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
