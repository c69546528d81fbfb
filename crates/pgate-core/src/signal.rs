//! Incoming trade signals.
//!
//! Signals are produced by scanners and dashboards that are not strict about
//! types: a price may arrive as `"101.5"` or `101.5`, a quantity as `2` or
//! `"2"`. Every field is normalized to an optional string on the way in.
//!
//! Falsy values (`null`, `""`, `0`, `false`) are treated as missing, so a
//! signal with `quantity: 0` still opens a popup with the default quantity.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Quantity used when a signal carries none.
pub const DEFAULT_QUANTITY: &str = "1";

/// An incoming trade recommendation.
///
/// `side` and `signal` both describe the trade direction; scanners usually
/// send only `signal` (`"BUY"` / `"SELL"`), order tickets send `side`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    #[serde(
        default,
        alias = "qty",
        deserialize_with = "loose_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub change: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub rsi: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Signal {
    /// Create a signal for a symbol on an exchange.
    pub fn new(symbol: impl Into<String>, exchange: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            exchange: Some(exchange.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_signal(mut self, signal: impl Into<String>) -> Self {
        self.signal = Some(signal.into());
        self
    }

    #[must_use]
    pub fn with_side(mut self, side: impl Into<String>) -> Self {
        self.side = Some(side.into());
        self
    }

    #[must_use]
    pub fn with_quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = Some(quantity.into());
        self
    }

    #[must_use]
    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Symbol used as the registry key (empty when missing).
    pub fn symbol_key(&self) -> &str {
        self.symbol.as_deref().unwrap_or_default()
    }

    /// Exchange used for busy checks (empty when missing).
    pub fn exchange_key(&self) -> &str {
        self.exchange.as_deref().unwrap_or_default()
    }

    /// Trade direction for the `side` parameter.
    pub fn side_param(&self) -> &str {
        self.side
            .as_deref()
            .or(self.signal.as_deref())
            .unwrap_or_default()
    }

    /// Trade direction for the `signal` parameter.
    pub fn signal_param(&self) -> &str {
        self.signal
            .as_deref()
            .or(self.side.as_deref())
            .unwrap_or_default()
    }

    pub fn quantity_param(&self) -> &str {
        self.quantity.as_deref().unwrap_or(DEFAULT_QUANTITY)
    }

    /// Reason text, generated from the direction when missing.
    pub fn reason_param(&self) -> String {
        match (&self.reason, self.signal_param()) {
            (Some(reason), _) => reason.clone(),
            (None, "") => "Scanner detected signal".to_string(),
            (None, direction) => format!("Scanner detected {direction} signal"),
        }
    }
}

/// Deserialize any JSON scalar into an optional string, dropping falsy values.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(normalize_value))
}

/// Normalize a JSON value into the string form used for popup parameters.
///
/// Returns `None` for falsy values.
pub(crate) fn normalize_value(value: Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_mixed_types() {
        let signal: Signal = serde_json::from_value(json!({
            "symbol": "BTCUSD",
            "exchange": "BINANCE",
            "signal": "BUY",
            "quantity": 2,
            "price": 64250.5,
            "rsi": "28.4"
        }))
        .unwrap();

        assert_eq!(signal.symbol_key(), "BTCUSD");
        assert_eq!(signal.exchange_key(), "BINANCE");
        assert_eq!(signal.quantity_param(), "2");
        assert_eq!(signal.price.as_deref(), Some("64250.5"));
        assert_eq!(signal.rsi.as_deref(), Some("28.4"));
        assert!(signal.change.is_none());
    }

    #[test]
    fn test_falsy_values_are_missing() {
        let signal: Signal = serde_json::from_value(json!({
            "symbol": "",
            "quantity": 0,
            "price": null,
            "change": false
        }))
        .unwrap();

        assert!(signal.symbol.is_none());
        assert_eq!(signal.quantity_param(), DEFAULT_QUANTITY);
        assert!(signal.price.is_none());
        assert!(signal.change.is_none());
    }

    #[test]
    fn test_qty_alias() {
        let signal: Signal = serde_json::from_value(json!({"qty": "5"})).unwrap();
        assert_eq!(signal.quantity_param(), "5");
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let signal: Signal = serde_json::from_value(json!({})).unwrap();
        assert_eq!(signal.symbol_key(), "");
        assert_eq!(signal.exchange_key(), "");
        assert_eq!(signal.quantity_param(), "1");
        assert_eq!(signal.side_param(), "");
        assert_eq!(signal.reason_param(), "Scanner detected signal");
    }

    #[test]
    fn test_side_and_signal_fall_back_to_each_other() {
        let from_signal = Signal::new("ETHUSD", "BINANCE").with_signal("SELL");
        assert_eq!(from_signal.side_param(), "SELL");
        assert_eq!(from_signal.signal_param(), "SELL");

        let from_side = Signal::new("ETHUSD", "BINANCE").with_side("BUY");
        assert_eq!(from_side.side_param(), "BUY");
        assert_eq!(from_side.signal_param(), "BUY");
    }

    #[test]
    fn test_reason_generated_from_direction() {
        let signal = Signal::new("AAPL", "ALPACA").with_signal("BUY");
        assert_eq!(signal.reason_param(), "Scanner detected BUY signal");

        let explicit = signal.with_reason("RSI oversold");
        assert_eq!(explicit.reason_param(), "RSI oversold");
    }
}
