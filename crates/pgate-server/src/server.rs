//! HTTP server implementation using axum.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use futures_util::stream::StreamExt;
use futures_util::SinkExt;
use pgate_core::{PopupParams, Signal, POPUP_PATH};
use pgate_launcher::LaunchOutcome;
use pgate_notify::{CompletionOutcome, COMPLETION_PATH};
use pgate_session::{SessionError, SessionHandle};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::types::{CompletedResponse, EventResponse, GateMessage, LaunchResponse};

/// Capacity of the gate message broadcast.
const GATE_CHANNEL_CAPACITY: usize = 64;

/// Create the broadcast channel carrying alerts and session events.
pub fn gate_channel() -> broadcast::Sender<GateMessage> {
    broadcast::channel(GATE_CHANNEL_CAPACITY).0
}

/// Connection limiter to prevent too many concurrent WebSocket connections.
pub struct ConnectionLimiter {
    current: AtomicUsize,
    max: usize,
}

impl ConnectionLimiter {
    pub fn new(max: usize) -> Self {
        Self {
            current: AtomicUsize::new(0),
            max,
        }
    }

    pub fn try_acquire(self: &Arc<Self>) -> Option<ConnectionGuard> {
        let acquired = self
            .current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < self.max).then_some(current + 1)
            })
            .is_ok();
        acquired.then(|| ConnectionGuard {
            limiter: Arc::clone(self),
        })
    }

    pub fn current_count(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }
}

/// Releases a connection slot on drop.
pub struct ConnectionGuard {
    limiter: Arc<ConnectionLimiter>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.limiter.current.fetch_sub(1, Ordering::Release);
    }
}

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    session: SessionHandle,
    gate_tx: broadcast::Sender<GateMessage>,
    connection_limiter: Arc<ConnectionLimiter>,
}

impl AppState {
    pub fn new(
        session: SessionHandle,
        gate_tx: broadcast::Sender<GateMessage>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            session,
            gate_tx,
            connection_limiter: Arc::new(ConnectionLimiter::new(config.max_connections)),
        }
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/signal", post(post_signal))
        .route("/api/events", post(post_event))
        .route(COMPLETION_PATH, post(post_trade_completed))
        .route("/api/state", get(get_state))
        .route(POPUP_PATH, get(serve_popup))
        .route("/ws", get(ws_handler))
        .route("/metrics", get(get_metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Launch a popup for a signal.
async fn post_signal(
    State(state): State<AppState>,
    Json(signal): Json<Signal>,
) -> (StatusCode, Json<LaunchResponse>) {
    match state.session.launch(signal).await {
        Ok(LaunchOutcome::Opened { symbol, window }) => (
            StatusCode::OK,
            Json(LaunchResponse::Opened {
                symbol,
                window_id: window.id.to_string(),
            }),
        ),
        Ok(LaunchOutcome::Rejected(reason)) => {
            (StatusCode::OK, Json(LaunchResponse::Rejected { reason }))
        }
        Err(SessionError::Launch(e)) => (
            StatusCode::BAD_GATEWAY,
            Json(LaunchResponse::Failed {
                kind: e.kind().to_string(),
                message: e.user_message().to_string(),
            }),
        ),
        Err(SessionError::Closed) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(LaunchResponse::Failed {
                kind: "closed".to_string(),
                message: "Session closed".to_string(),
            }),
        ),
    }
}

/// Accept an inbound event from a popup window.
async fn post_event(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<EventResponse>, StatusCode> {
    let outcome = state.session.deliver(payload).await.map_err(|e| {
        warn!(error = %e, "Failed to deliver inbound event");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    let response = match outcome {
        CompletionOutcome::Completed { symbol, .. } => EventResponse {
            status: "completed",
            symbol: Some(symbol),
        },
        CompletionOutcome::Ignored => EventResponse {
            status: "ignored",
            symbol: None,
        },
    };
    Ok(Json(response))
}

/// Backend completion endpoint.
async fn post_trade_completed(Json(payload): Json<Value>) -> Json<CompletedResponse> {
    let symbol = payload
        .get("symbol")
        .and_then(Value::as_str)
        .unwrap_or("Unknown");
    info!(symbol, "Trade completed");
    Json(CompletedResponse {
        success: true,
        message: "Scanner resumed",
    })
}

/// Get the current registry snapshot.
async fn get_state(State(state): State<AppState>) -> Response {
    match state.session.snapshot().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    }
}

/// Serve the trade popup page.
async fn serve_popup(Query(params): Query<PopupParams>) -> Html<&'static str> {
    debug!(
        symbol = %params.symbol,
        side = %params.side,
        qty = %params.qty,
        exchange = %params.exchange,
        "Serving trade popup"
    );
    Html(include_str!("../static/trade_popup.html"))
}

/// Render Prometheus metrics.
async fn get_metrics() -> Response {
    match pgate_telemetry::render_metrics() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// WebSocket upgrade handler.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let guard = match state.connection_limiter.try_acquire() {
        Some(guard) => guard,
        None => {
            warn!(
                current = state.connection_limiter.current_count(),
                "WebSocket connection limit reached"
            );
            return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
        }
    };

    info!(
        connections = state.connection_limiter.current_count(),
        "New WebSocket connection"
    );

    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, guard))
}

/// Handle a WebSocket connection.
async fn handle_ws_connection(socket: WebSocket, state: AppState, _guard: ConnectionGuard) {
    let (mut sender, mut receiver) = socket.split();
    let mut gate_rx = state.gate_tx.subscribe();

    // Initial snapshot
    if let Ok(snapshot) = state.session.snapshot().await {
        if let Ok(json) = serde_json::to_string(&GateMessage::Snapshot(snapshot)) {
            if sender.send(Message::Text(json.into())).await.is_err() {
                debug!("Failed to send initial snapshot, client disconnected");
                return;
            }
        }
    }

    // Incoming side only watches for close
    let mut incoming_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "WebSocket receive error");
                    break;
                }
                _ => {}
            }
        }
    });

    loop {
        tokio::select! {
            result = gate_rx.recv() => {
                match result {
                    Ok(msg) => {
                        let json = match serde_json::to_string(&msg) {
                            Ok(json) => json,
                            Err(e) => {
                                debug!(error = %e, "Failed to serialize gate message");
                                continue;
                            }
                        };
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            debug!("Failed to send message, client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "WebSocket client lagged, catching up");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Gate channel closed");
                        break;
                    }
                }
            }
            _ = &mut incoming_task => {
                debug!("Incoming task completed, closing connection");
                break;
            }
        }
    }

    incoming_task.abort();
    info!("WebSocket connection closed");
}

/// Forward session events onto the gate channel.
async fn forward_session_events(session: SessionHandle, gate_tx: broadcast::Sender<GateMessage>) {
    let mut events = session.subscribe();
    loop {
        match events.recv().await {
            Ok(event) => {
                let _ = gate_tx.send(GateMessage::Event(event));
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "Session event forwarder lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Run the HTTP server until `shutdown` is cancelled.
pub async fn run_server(
    session: SessionHandle,
    gate_tx: broadcast::Sender<GateMessage>,
    config: ServerConfig,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = AppState::new(session.clone(), gate_tx.clone(), &config);
    let app = create_router(state);

    tokio::spawn(forward_session_events(session, gate_tx));

    let addr = config.bind_addr()?;
    info!(%addr, "Starting popup gate server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Popup gate server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use pgate_launcher::{
        MockOpenBehavior, MockWindowOpener, PopupConfig, PopupLauncher, RecordingAlertSink,
    };
    use pgate_notify::{CompletionListener, MockNotifier};
    use pgate_session::spawn_session;
    use serde_json::json;
    use tower::ServiceExt;

    struct Fixture {
        router: Router,
        opener: Arc<MockWindowOpener>,
    }

    fn fixture() -> Fixture {
        let opener = Arc::new(MockWindowOpener::new());
        let launcher = PopupLauncher::new(
            &PopupConfig::default(),
            opener.clone(),
            Arc::new(RecordingAlertSink::new()),
        )
        .unwrap();
        let listener = CompletionListener::new(Arc::new(MockNotifier::new()));
        let (session, _join) = spawn_session(launcher, listener, 16);
        let state = AppState::new(session, gate_channel(), &ServerConfig::default());
        Fixture {
            router: create_router(state),
            opener,
        }
    }

    async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(router: &Router, uri: &str) -> Value {
        let response = router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_signal_then_busy_then_completion() {
        let f = fixture();

        let (status, body) = post_json(
            &f.router,
            "/api/signal",
            json!({"symbol": "BTCUSD", "exchange": "BINANCE", "signal": "BUY", "quantity": "2"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "opened");
        assert_eq!(body["symbol"], "BTCUSD");

        let (_, body) = post_json(
            &f.router,
            "/api/signal",
            json!({"symbol": "ETHUSD", "exchange": "BINANCE", "signal": "SELL"}),
        )
        .await;
        assert_eq!(body["status"], "rejected");
        assert_eq!(body["reason"], "exchange_busy");

        let state = get_json(&f.router, "/api/state").await;
        assert_eq!(state["open_popups"], json!(["BTCUSD"]));
        assert_eq!(state["active_trade"]["exchange"], "BINANCE");

        let (_, body) = post_json(
            &f.router,
            "/api/events",
            json!({"type": "TRADE_CLOSED", "symbol": "BTCUSD"}),
        )
        .await;
        assert_eq!(body["status"], "completed");

        let state = get_json(&f.router, "/api/state").await;
        assert_eq!(state["open_popups"], json!([]));
        assert!(state["active_trade"].is_null());
        assert_eq!(f.opener.open_count(), 1);
    }

    #[tokio::test]
    async fn test_blocked_popup_returns_failure() {
        let f = fixture();
        f.opener.set_behavior(MockOpenBehavior::Blocked);

        let (status, body) = post_json(
            &f.router,
            "/api/signal",
            json!({"symbol": "AAPL", "exchange": "ALPACA"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], "failed");
        assert_eq!(body["kind"], "blocked");
        assert_eq!(
            body["message"],
            "Popup blocked. Please allow popups for this site."
        );
    }

    #[tokio::test]
    async fn test_unknown_event_ignored() {
        let f = fixture();
        let (status, body) =
            post_json(&f.router, "/api/events", json!({"type": "RESIZE"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ignored");
    }

    #[tokio::test]
    async fn test_trade_completed_endpoint() {
        let f = fixture();
        let (status, body) = post_json(
            &f.router,
            "/api/trade-completed",
            json!({"type": "TRADE_CLOSED", "symbol": "BTCUSD"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "message": "Scanner resumed"}));
    }

    #[tokio::test]
    async fn test_popup_page_served() {
        let f = fixture();
        let response = f
            .router
            .clone()
            .oneshot(
                Request::get("/trade-popup-fixed?symbol=BTCUSD&side=BUY&qty=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("TRADE_CLOSED"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let f = fixture();
        let response = f
            .router
            .clone()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_connection_limiter() {
        let limiter = Arc::new(ConnectionLimiter::new(1));
        let guard = limiter.try_acquire();
        assert!(guard.is_some());
        assert!(limiter.try_acquire().is_none());
        drop(guard);
        assert_eq!(limiter.current_count(), 0);
        assert!(limiter.try_acquire().is_some());
    }
}
