//! Popup launcher.

use std::sync::Arc;
use std::time::Duration;

use pgate_core::{PopupRequest, Signal, WindowFeatures};
use pgate_registry::PopupRegistry;
use serde::Serialize;
use tracing::{error, info, warn};
use url::Url;

use crate::alert::AlertSink;
use crate::config::PopupConfig;
use crate::error::{LaunchError, LaunchResult};
use crate::expiry::ExpiryScheduler;
use crate::opener::{WindowHandle, WindowOpener};

/// Why a signal did not open a popup. Rejections are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Another trade is active on the signal's exchange.
    ExchangeBusy,
    /// A popup is already open for the signal's symbol.
    AlreadyOpen,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExchangeBusy => "exchange_busy",
            Self::AlreadyOpen => "already_open",
        }
    }
}

/// Result of a launch that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Opened { symbol: String, window: WindowHandle },
    Rejected(RejectReason),
}

impl LaunchOutcome {
    pub fn is_opened(&self) -> bool {
        matches!(self, Self::Opened { .. })
    }
}

/// Opens trade popups for signals, one per symbol and one active trade at a
/// time.
pub struct PopupLauncher {
    base_url: Url,
    features: WindowFeatures,
    expiry: Duration,
    opener: Arc<dyn WindowOpener>,
    alerts: Arc<dyn AlertSink>,
}

impl PopupLauncher {
    /// Create a launcher.
    ///
    /// # Errors
    /// Returns `LaunchError::InvalidConfig` if the configuration is invalid.
    pub fn new(
        config: &PopupConfig,
        opener: Arc<dyn WindowOpener>,
        alerts: Arc<dyn AlertSink>,
    ) -> LaunchResult<Self> {
        config.validate()?;
        Ok(Self {
            base_url: config.parsed_base_url()?,
            features: config.window,
            expiry: config.expiry(),
            opener,
            alerts,
        })
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Launch a popup for `signal`.
    ///
    /// On success the symbol is marked open, the trade becomes active and an
    /// expiry is scheduled. On error the user is alerted and the registry is
    /// left untouched.
    pub fn launch(
        &self,
        registry: &mut PopupRegistry,
        scheduler: &dyn ExpiryScheduler,
        signal: &Signal,
    ) -> LaunchResult<LaunchOutcome> {
        let symbol = signal.symbol_key();
        let exchange = signal.exchange_key();

        if registry.is_exchange_busy(exchange) {
            info!(symbol, exchange, "Trade blocked: exchange busy");
            return Ok(LaunchOutcome::Rejected(RejectReason::ExchangeBusy));
        }

        if registry.is_open(symbol) {
            info!(symbol, "Popup already open");
            return Ok(LaunchOutcome::Rejected(RejectReason::AlreadyOpen));
        }

        let window = match self.open_window(signal) {
            Ok(window) => window,
            Err(e) => {
                self.alerts.alert(e.user_message());
                return Err(e);
            }
        };

        registry.mark_open(symbol);
        registry.set_active(symbol, exchange);
        scheduler.schedule(symbol.to_string(), self.expiry);

        info!(
            symbol,
            exchange,
            window = %window.name,
            window_id = %window.id,
            "Trade popup opened"
        );

        Ok(LaunchOutcome::Opened {
            symbol: symbol.to_string(),
            window,
        })
    }

    fn open_window(&self, signal: &Signal) -> LaunchResult<WindowHandle> {
        let symbol = signal.symbol_key();
        let request = PopupRequest::build(&self.base_url, signal, self.features).map_err(|e| {
            error!(symbol, error = %e, "Failed to build popup target");
            LaunchError::UnexpectedOpenFailure {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            }
        })?;

        match self.opener.open(&request) {
            Ok(Some(window)) => Ok(window),
            Ok(None) => {
                warn!(symbol, opener = self.opener.name(), "Popup blocked");
                Err(LaunchError::PopupBlocked {
                    symbol: symbol.to_string(),
                })
            }
            Err(e) => {
                error!(symbol, opener = self.opener.name(), error = %e, "Failed to open trade popup");
                Err(LaunchError::UnexpectedOpenFailure {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
