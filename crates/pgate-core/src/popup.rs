//! Popup target construction.
//!
//! A popup is addressed by `<base_url>/trade-popup-fixed?<query>` and opened in
//! a window named `TradeWindow_<symbol>`, so a second open for the same symbol
//! reuses the same window in hosts that honor window names.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use url::Url;

use crate::error::Result;
use crate::signal::Signal;

/// Path of the trade popup page.
pub const POPUP_PATH: &str = "/trade-popup-fixed";

/// Prefix of the per-symbol window name.
pub const WINDOW_NAME_PREFIX: &str = "TradeWindow_";

/// Popup query parameters.
///
/// Field order is the query parameter order. Every field is a plain string;
/// the popup page receives empty strings for anything the signal lacked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupParams {
    pub symbol: String,
    pub side: String,
    pub qty: String,
    pub exchange: String,
    pub price: String,
    pub change: String,
    pub rsi: String,
    pub signal: String,
    pub reason: String,
}

impl PopupParams {
    /// Build the parameter set for a signal, applying field defaults.
    pub fn from_signal(signal: &Signal) -> Self {
        Self {
            symbol: signal.symbol_key().to_string(),
            side: signal.side_param().to_string(),
            qty: signal.quantity_param().to_string(),
            exchange: signal.exchange_key().to_string(),
            price: signal.price.clone().unwrap_or_default(),
            change: signal.change.clone().unwrap_or_default(),
            rsi: signal.rsi.clone().unwrap_or_default(),
            signal: signal.signal_param().to_string(),
            reason: signal.reason_param(),
        }
    }

    /// Encode as an `application/x-www-form-urlencoded` query string.
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("symbol", &self.symbol)
            .append_pair("side", &self.side)
            .append_pair("qty", &self.qty)
            .append_pair("exchange", &self.exchange)
            .append_pair("price", &self.price)
            .append_pair("change", &self.change)
            .append_pair("rsi", &self.rsi)
            .append_pair("signal", &self.signal)
            .append_pair("reason", &self.reason)
            .finish()
    }
}

/// Window geometry and chrome settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFeatures {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub resizable: bool,
    #[serde(default)]
    pub scrollbars: bool,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub menubar: bool,
    #[serde(default)]
    pub toolbar: bool,
}

fn default_width() -> u32 {
    900
}

fn default_height() -> u32 {
    1000
}

impl Default for WindowFeatures {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            resizable: false,
            scrollbars: false,
            status: false,
            menubar: false,
            toolbar: false,
        }
    }
}

impl WindowFeatures {
    /// Render as a window feature string
    /// (e.g. `width=900,height=1000,resizable=no,...`).
    pub fn to_feature_string(&self) -> String {
        fn flag(on: bool) -> &'static str {
            if on {
                "yes"
            } else {
                "no"
            }
        }

        format!(
            "width={},height={},resizable={},scrollbars={},status={},menubar={},toolbar={}",
            self.width,
            self.height,
            flag(self.resizable),
            flag(self.scrollbars),
            flag(self.status),
            flag(self.menubar),
            flag(self.toolbar),
        )
    }
}

/// Everything a window opener needs to show one trade popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupRequest {
    /// Symbol the popup trades.
    pub symbol: String,
    /// Full popup URL including the query string.
    pub url: Url,
    /// Per-symbol window name.
    pub window_name: String,
    /// Window geometry.
    pub features: WindowFeatures,
}

impl PopupRequest {
    /// Build the popup request for a signal.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidUrl` if `base_url` cannot be joined with the
    /// popup path.
    pub fn build(base_url: &Url, signal: &Signal, features: WindowFeatures) -> Result<Self> {
        let params = PopupParams::from_signal(signal);
        let mut url = base_url.join(POPUP_PATH)?;
        url.set_query(Some(&params.to_query()));

        Ok(Self {
            symbol: params.symbol.clone(),
            url,
            window_name: window_name(&params.symbol),
            features,
        })
    }
}

/// Window name for a symbol.
pub fn window_name(symbol: &str) -> String {
    format!("{WINDOW_NAME_PREFIX}{symbol}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://127.0.0.1:8080").unwrap()
    }

    #[test]
    fn test_btcusd_popup_url() {
        let signal = Signal::new("BTCUSD", "BINANCE")
            .with_signal("BUY")
            .with_quantity("2");
        let request = PopupRequest::build(&base(), &signal, WindowFeatures::default()).unwrap();

        assert_eq!(request.url.path(), "/trade-popup-fixed");
        assert_eq!(
            request.url.query(),
            Some(
                "symbol=BTCUSD&side=BUY&qty=2&exchange=BINANCE&price=&change=&rsi=&signal=BUY\
                 &reason=Scanner+detected+BUY+signal"
            )
        );
        assert_eq!(request.window_name, "TradeWindow_BTCUSD");
        assert_eq!(request.symbol, "BTCUSD");
    }

    #[test]
    fn test_query_is_url_encoded() {
        let signal = Signal::new("BTC/USD", "CRYPTO")
            .with_signal("SELL")
            .with_reason("RSI > 70 & falling");
        let query = PopupParams::from_signal(&signal).to_query();

        assert!(query.starts_with("symbol=BTC%2FUSD&"));
        assert!(query.ends_with("reason=RSI+%3E+70+%26+falling"));
    }

    #[test]
    fn test_missing_fields_become_empty() {
        let params = PopupParams::from_signal(&Signal::default());
        assert_eq!(params.symbol, "");
        assert_eq!(params.exchange, "");
        assert_eq!(params.qty, "1");
        assert_eq!(params.price, "");
    }

    #[test]
    fn test_base_url_path_is_replaced() {
        let base = Url::parse("https://scanner.example.com/dashboard/").unwrap();
        let request =
            PopupRequest::build(&base, &Signal::new("AAPL", "ALPACA"), WindowFeatures::default())
                .unwrap();
        assert_eq!(request.url.host_str(), Some("scanner.example.com"));
        assert_eq!(request.url.path(), "/trade-popup-fixed");
    }

    #[test]
    fn test_default_feature_string() {
        assert_eq!(
            WindowFeatures::default().to_feature_string(),
            "width=900,height=1000,resizable=no,scrollbars=no,status=no,menubar=no,toolbar=no"
        );
    }

    #[test]
    fn test_params_deserialize_partial_query() {
        let params: PopupParams =
            serde_json::from_value(serde_json::json!({"symbol": "TSLA", "qty": "3"})).unwrap();
        assert_eq!(params.symbol, "TSLA");
        assert_eq!(params.qty, "3");
        assert_eq!(params.reason, "");
    }
}
