//! Session actor task and handle.

use std::time::Duration;

use pgate_core::{InboundEvent, Signal};
use pgate_launcher::{ExpiryScheduler, LaunchOutcome, LaunchResult, PopupLauncher};
use pgate_notify::{CompletionListener, CompletionOutcome};
use pgate_registry::{PopupRegistry, RegistrySnapshot};
use pgate_telemetry::Metrics;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::{SessionError, SessionResult};
use crate::events::{now_ms, SessionEvent};

/// Capacity of the session event broadcast.
const EVENT_CAPACITY: usize = 64;

// ============================================================================
// SessionMsg
// ============================================================================

/// Messages for the session actor.
#[derive(Debug)]
pub enum SessionMsg {
    /// Launch a popup for a signal.
    Launch {
        signal: Signal,
        reply: Option<oneshot::Sender<LaunchResult<LaunchOutcome>>>,
    },

    /// Inbound event from a popup.
    Inbound {
        event: InboundEvent,
        reply: Option<oneshot::Sender<CompletionOutcome>>,
    },

    /// Expiry timer fired for a symbol.
    Expire(String),

    /// Request a registry snapshot.
    Snapshot(oneshot::Sender<RegistrySnapshot>),

    /// Graceful shutdown.
    Shutdown,
}

// ============================================================================
// SessionExpiryScheduler
// ============================================================================

/// Expiry scheduler feeding `SessionMsg::Expire` back into the session.
///
/// Holds a weak sender so pending timers do not keep a finished session
/// alive.
#[derive(Clone)]
pub struct SessionExpiryScheduler {
    tx: mpsc::WeakSender<SessionMsg>,
}

impl SessionExpiryScheduler {
    pub fn new(tx: &mpsc::Sender<SessionMsg>) -> Self {
        Self { tx: tx.downgrade() }
    }
}

impl ExpiryScheduler for SessionExpiryScheduler {
    fn schedule(&self, symbol: String, after: Duration) {
        let weak = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(tx) = weak.upgrade() {
                let _ = tx.send(SessionMsg::Expire(symbol)).await;
            }
        });
    }
}

// ============================================================================
// SessionTask
// ============================================================================

/// Session actor task.
///
/// Runs in its own tokio task and owns the registry.
pub struct SessionTask {
    rx: mpsc::Receiver<SessionMsg>,
    registry: PopupRegistry,
    launcher: PopupLauncher,
    listener: CompletionListener,
    scheduler: SessionExpiryScheduler,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionTask {
    /// Run the session until Shutdown is received or all handles are dropped.
    pub async fn run(mut self) {
        debug!("SessionTask started");

        while let Some(msg) = self.rx.recv().await {
            if matches!(msg, SessionMsg::Shutdown) {
                debug!("SessionTask shutting down");
                break;
            }
            self.handle_message(msg);
            Metrics::registry_state(self.registry.open_count(), self.registry.active().is_some());
        }

        debug!("SessionTask terminated");
    }

    fn handle_message(&mut self, msg: SessionMsg) {
        match msg {
            SessionMsg::Launch { signal, reply } => {
                let result = self.on_launch(&signal);
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            SessionMsg::Inbound { event, reply } => {
                let outcome = self.on_inbound(event);
                if let Some(reply) = reply {
                    let _ = reply.send(outcome);
                }
            }
            SessionMsg::Expire(symbol) => self.on_expire(symbol),
            SessionMsg::Snapshot(reply) => {
                let _ = reply.send(self.registry.snapshot());
            }
            SessionMsg::Shutdown => {}
        }
    }

    fn on_launch(&mut self, signal: &Signal) -> LaunchResult<LaunchOutcome> {
        let result = self
            .launcher
            .launch(&mut self.registry, &self.scheduler, signal);

        let event = match &result {
            Ok(LaunchOutcome::Opened { symbol, window }) => {
                Metrics::popup_opened();
                SessionEvent::PopupOpened {
                    symbol: symbol.clone(),
                    exchange: signal.exchange_key().to_string(),
                    window_id: window.id.to_string(),
                    timestamp_ms: now_ms(),
                }
            }
            Ok(LaunchOutcome::Rejected(reason)) => {
                Metrics::launch_rejected(reason.as_str());
                SessionEvent::LaunchRejected {
                    symbol: signal.symbol_key().to_string(),
                    exchange: signal.exchange_key().to_string(),
                    reason: *reason,
                    timestamp_ms: now_ms(),
                }
            }
            Err(e) => {
                Metrics::launch_failed(e.kind());
                SessionEvent::LaunchFailed {
                    symbol: signal.symbol_key().to_string(),
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                    timestamp_ms: now_ms(),
                }
            }
        };
        self.publish(event);

        result
    }

    fn on_inbound(&mut self, event: InboundEvent) -> CompletionOutcome {
        // Delivery runs detached; its outcome arrives on the report channel.
        let (outcome, _delivery) = self.listener.on_event(&mut self.registry, event);

        if let CompletionOutcome::Completed {
            symbol,
            cleared_active,
            ..
        } = &outcome
        {
            Metrics::trade_completed();
            self.publish(SessionEvent::TradeClosed {
                symbol: symbol.clone(),
                cleared_active: *cleared_active,
                timestamp_ms: now_ms(),
            });
        }

        outcome
    }

    fn on_expire(&mut self, symbol: String) {
        if self.registry.mark_closed(&symbol) {
            debug!(symbol = %symbol, "Open popup entry expired");
            Metrics::popup_expired();
            self.publish(SessionEvent::PopupExpired {
                symbol,
                timestamp_ms: now_ms(),
            });
        } else {
            trace!(symbol = %symbol, "Expiry for already closed popup");
        }
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is normal when no UI is connected.
        let _ = self.events.send(event);
    }
}

// ============================================================================
// SessionHandle
// ============================================================================

/// Handle for interacting with the session actor.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionMsg>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Launch a popup and wait for the outcome.
    pub async fn launch(&self, signal: Signal) -> SessionResult<LaunchOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionMsg::Launch {
            signal,
            reply: Some(reply),
        })
        .await?;
        Ok(rx.await.map_err(|_| SessionError::Closed)??)
    }

    /// Queue a launch without waiting for its outcome.
    pub async fn submit(&self, signal: Signal) -> SessionResult<()> {
        self.send(SessionMsg::Launch {
            signal,
            reply: None,
        })
        .await
    }

    /// Deliver a raw inbound event payload.
    pub async fn deliver(&self, payload: Value) -> SessionResult<CompletionOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionMsg::Inbound {
            event: InboundEvent::from_value(payload),
            reply: Some(reply),
        })
        .await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Get a snapshot of the registry.
    pub async fn snapshot(&self) -> SessionResult<RegistrySnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionMsg::Snapshot(reply)).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Request graceful shutdown.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(SessionMsg::Shutdown).await;
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn send(&self, msg: SessionMsg) -> SessionResult<()> {
        self.tx.send(msg).await.map_err(|_| SessionError::Closed)
    }
}

// ============================================================================
// Spawn function
// ============================================================================

/// Spawn the session actor.
///
/// Returns a handle for interaction and a join handle for the task.
#[must_use]
pub fn spawn_session(
    launcher: PopupLauncher,
    listener: CompletionListener,
    capacity: usize,
) -> (SessionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity);
    let (events, _) = broadcast::channel(EVENT_CAPACITY);

    let task = SessionTask {
        rx,
        registry: PopupRegistry::new(),
        launcher,
        listener,
        scheduler: SessionExpiryScheduler::new(&tx),
        events: events.clone(),
    };

    let handle = SessionHandle { tx, events };
    let join_handle = tokio::spawn(task.run());

    (handle, join_handle)
}

// ============================================================================
// Tests
// ============================================================================
