//! Alerts pushed to connected UI clients.

use pgate_launcher::AlertSink;
use tokio::sync::broadcast;
use tracing::{trace, warn};

use crate::types::GateMessage;

/// Alert sink broadcasting to WebSocket clients. Alerts are logged too, so
/// they are not lost when no client is connected.
#[derive(Debug, Clone)]
pub struct BroadcastAlertSink {
    tx: broadcast::Sender<GateMessage>,
}

impl BroadcastAlertSink {
    pub fn new(tx: broadcast::Sender<GateMessage>) -> Self {
        Self { tx }
    }
}

impl AlertSink for BroadcastAlertSink {
    fn alert(&self, message: &str) {
        warn!(alert = message, "User alert");
        let msg = GateMessage::Alert {
            message: message.to_string(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        };
        if self.tx.send(msg).is_err() {
            trace!("No WebSocket receivers for alert");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_alert_reaches_subscriber() {
        let (tx, _) = broadcast::channel(4);
        let mut rx = tx.subscribe();
        BroadcastAlertSink::new(tx).alert("Popup blocked");

        match rx.recv().await.unwrap() {
            GateMessage::Alert { message, .. } => assert_eq!(message, "Popup blocked"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_alert_without_subscribers() {
        let (tx, _) = broadcast::channel(4);
        BroadcastAlertSink::new(tx).alert("nobody listening");
    }
}
