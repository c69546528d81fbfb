//! Completion listener.

use std::sync::Arc;

use pgate_core::InboundEvent;
use pgate_registry::PopupRegistry;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::NotifyResult;
use crate::notifier::CompletionNotifier;

/// What the listener did with an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// A `TRADE_CLOSED` event was applied and forwarded.
    Completed {
        symbol: String,
        /// The closed symbol was the active trade.
        cleared_active: bool,
        /// The closed symbol had an open popup entry.
        was_open: bool,
    },
    /// Not a completion event.
    Ignored,
}

/// Outcome of one backend delivery.
#[derive(Debug)]
pub struct NotificationReport {
    pub symbol: String,
    pub result: NotifyResult<()>,
}

/// Applies completion events to the registry and forwards them to the
/// backend.
pub struct CompletionListener {
    notifier: Arc<dyn CompletionNotifier>,
    reports: Option<mpsc::UnboundedSender<NotificationReport>>,
}

impl CompletionListener {
    pub fn new(notifier: Arc<dyn CompletionNotifier>) -> Self {
        Self {
            notifier,
            reports: None,
        }
    }

    /// Publish delivery outcomes on `reports`.
    #[must_use]
    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<NotificationReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Handle an inbound event.
    ///
    /// Registry updates happen before this returns. Backend delivery is
    /// spawned and its join handle returned; callers normally drop it.
    /// Must be called from within a tokio runtime.
    pub fn on_event(
        &self,
        registry: &mut PopupRegistry,
        event: InboundEvent,
    ) -> (CompletionOutcome, Option<JoinHandle<()>>) {
        let closed = match event {
            InboundEvent::TradeClosed(closed) => closed,
            InboundEvent::Ignored { kind } => {
                debug!(kind = ?kind, "Ignoring inbound event");
                return (CompletionOutcome::Ignored, None);
            }
        };

        let cleared_active = registry.clear_active_if_matches(&closed.symbol);
        let was_open = registry.mark_closed(&closed.symbol);

        info!(
            symbol = %closed.symbol,
            cleared_active,
            was_open,
            "Trade closed"
        );

        let delivery = self.spawn_delivery(closed.symbol.clone(), closed.payload);

        (
            CompletionOutcome::Completed {
                symbol: closed.symbol,
                cleared_active,
                was_open,
            },
            Some(delivery),
        )
    }

    fn spawn_delivery(&self, symbol: String, payload: serde_json::Value) -> JoinHandle<()> {
        let notifier = self.notifier.clone();
        let reports = self.reports.clone();

        tokio::spawn(async move {
            let result = notifier.notify(payload).await;
            if let Err(e) = &result {
                warn!(symbol = %symbol, error = %e, "Completion notification failed");
            }
            if let Some(reports) = reports {
                // Receiver gone means nobody is interested in reports.
                let _ = reports.send(NotificationReport { symbol, result });
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::notifier::MockNotifier;
    use pgate_core::ActiveTrade;
    use serde_json::json;

    fn closed(symbol: &str) -> InboundEvent {
        InboundEvent::from_value(json!({"type": "TRADE_CLOSED", "symbol": symbol, "filled": true}))
    }

    #[tokio::test]
    async fn test_trade_closed_clears_registry_and_notifies() {
        let notifier = Arc::new(MockNotifier::new());
        let listener = CompletionListener::new(notifier.clone());
        let mut registry = PopupRegistry::new();
        registry.mark_open("BTCUSD");
        registry.set_active("BTCUSD", "BINANCE");

        let (outcome, delivery) = listener.on_event(&mut registry, closed("BTCUSD"));
        delivery.unwrap().await.unwrap();

        assert_eq!(
            outcome,
            CompletionOutcome::Completed {
                symbol: "BTCUSD".to_string(),
                cleared_active: true,
                was_open: true,
            }
        );
        assert!(registry.active().is_none());
        assert!(!registry.is_open("BTCUSD"));
        assert_eq!(
            notifier.payloads(),
            vec![json!({"type": "TRADE_CLOSED", "symbol": "BTCUSD", "filled": true})]
        );
    }

    #[tokio::test]
    async fn test_unrelated_symbol_keeps_active_trade() {
        let notifier = Arc::new(MockNotifier::new());
        let listener = CompletionListener::new(notifier.clone());
        let mut registry = PopupRegistry::new();
        registry.mark_open("BTCUSD");
        registry.set_active("BTCUSD", "BINANCE");

        let (outcome, delivery) = listener.on_event(&mut registry, closed("ETHUSD"));
        delivery.unwrap().await.unwrap();

        assert_eq!(
            outcome,
            CompletionOutcome::Completed {
                symbol: "ETHUSD".to_string(),
                cleared_active: false,
                was_open: false,
            }
        );
        assert_eq!(registry.active(), Some(&ActiveTrade::new("BTCUSD", "BINANCE")));
        assert!(registry.is_open("BTCUSD"));
        // Still forwarded.
        assert_eq!(notifier.payloads().len(), 1);
    }

    #[tokio::test]
    async fn test_other_event_types_ignored() {
        let notifier = Arc::new(MockNotifier::new());
        let listener = CompletionListener::new(notifier.clone());
        let mut registry = PopupRegistry::new();
        registry.mark_open("BTCUSD");

        let event = InboundEvent::from_value(json!({"type": "PING", "symbol": "BTCUSD"}));
        let (outcome, delivery) = listener.on_event(&mut registry, event);

        assert_eq!(outcome, CompletionOutcome::Ignored);
        assert!(delivery.is_none());
        assert!(registry.is_open("BTCUSD"));
        assert!(notifier.payloads().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_reported() {
        let notifier = Arc::new(MockNotifier::new());
        notifier.fail_with(502);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let listener = CompletionListener::new(notifier).with_reports(tx);
        let mut registry = PopupRegistry::new();
        registry.set_active("BTCUSD", "BINANCE");

        let (_, delivery) = listener.on_event(&mut registry, closed("BTCUSD"));
        delivery.unwrap().await.unwrap();

        // Registry is updated regardless of delivery.
        assert!(registry.active().is_none());

        let report = rx.recv().await.unwrap();
        assert_eq!(report.symbol, "BTCUSD");
        assert!(matches!(
            report.result,
            Err(NotifyError::Status { status: 502 })
        ));
    }

    #[tokio::test]
    async fn test_delivery_success_reported() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let listener = CompletionListener::new(Arc::new(MockNotifier::new())).with_reports(tx);
        let mut registry = PopupRegistry::new();

        let (_, delivery) = listener.on_event(&mut registry, closed("AAPL"));
        delivery.unwrap().await.unwrap();

        let report = rx.recv().await.unwrap();
        assert!(report.result.is_ok());
    }
}
