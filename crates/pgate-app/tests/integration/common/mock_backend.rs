//! Mock backend receiving completion notifications.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

type Received = Arc<Mutex<Vec<String>>>;

/// A mock backend recording raw `POST /api/trade-completed` bodies.
pub struct MockBackend {
    addr: SocketAddr,
    received: Received,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    /// Start on an available port.
    pub async fn start() -> Self {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/api/trade-completed", post(record))
            .with_state(received.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            addr,
            received,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Wait until at least `count` notifications arrived.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let received = self.received.lock().clone();
            if received.len() >= count || tokio::time::Instant::now() >= deadline {
                return received;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn record(State(received): State<Received>, body: String) -> Json<Value> {
    received.lock().push(body);
    Json(serde_json::json!({"success": true}))
}
