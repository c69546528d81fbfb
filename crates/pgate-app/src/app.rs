//! Application wiring and lifecycle.

use std::sync::Arc;

use pgate_launcher::{build_opener, AlertSink, PopupLauncher};
use pgate_notify::{CompletionListener, HttpNotifier, NotificationReport};
use pgate_server::{gate_channel, run_server, BroadcastAlertSink, GateMessage};
use pgate_session::{spawn_session, SessionHandle};
use pgate_telemetry::Metrics;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// A running session with its supporting tasks.
pub struct SessionParts {
    pub session: SessionHandle,
    pub session_task: JoinHandle<()>,
    pub report_task: JoinHandle<()>,
}

/// Main application.
pub struct Application {
    config: AppConfig,
    shutdown: CancellationToken,
}

impl Application {
    /// Create the application from validated configuration.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shutdown: CancellationToken::new(),
        })
    }

    /// Token cancelled when the application shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Build the launcher and listener and spawn the session.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_session(&self, alerts: Arc<dyn AlertSink>) -> AppResult<SessionParts> {
        let opener = build_opener(&self.config.opener);
        info!(opener = opener.name(), "Window opener ready");

        let launcher = PopupLauncher::new(&self.config.popup, opener, alerts)?;

        let notifier = HttpNotifier::new(&self.config.notify)?;
        info!(endpoint = %notifier.endpoint(), "Completion notifier ready");

        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let listener = CompletionListener::new(Arc::new(notifier)).with_reports(report_tx);

        let (session, session_task) =
            spawn_session(launcher, listener, self.config.session.channel_capacity);
        let report_task = tokio::spawn(watch_notification_reports(report_rx));

        Ok(SessionParts {
            session,
            session_task,
            report_task,
        })
    }

    /// Run until Ctrl-C or server failure.
    pub async fn run(self) -> AppResult<()> {
        let gate_tx: broadcast::Sender<GateMessage> = gate_channel();
        let alerts = Arc::new(BroadcastAlertSink::new(gate_tx.clone()));
        let parts = self.start_session(alerts)?;

        let mut server = tokio::spawn(run_server(
            parts.session.clone(),
            gate_tx,
            self.config.server.clone(),
            self.shutdown.clone(),
        ));

        let finished = tokio::select! {
            _ = tokio::signal::ctrl_c() => None,
            result = &mut server => Some(result),
        };
        let server_result = match finished {
            Some(result) => result,
            None => {
                info!("Shutdown signal received");
                self.shutdown.cancel();
                server.await
            }
        };

        parts.session.shutdown().await;
        if let Err(e) = parts.session_task.await {
            warn!(error = %e, "Session task ended abnormally");
        }
        parts.report_task.abort();

        match server_result {
            Ok(Ok(())) => {
                info!("Popup gate stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "Server failed");
                Err(AppError::Server(e.to_string()))
            }
            Err(e) => Err(AppError::Server(format!("Server task panicked: {e}"))),
        }
    }
}

/// Log and count backend notification outcomes.
async fn watch_notification_reports(mut reports: mpsc::UnboundedReceiver<NotificationReport>) {
    while let Some(report) = reports.recv().await {
        match report.result {
            Ok(()) => debug!(symbol = %report.symbol, "Backend notified of completion"),
            Err(e) => {
                Metrics::notify_failed();
                warn!(symbol = %report.symbol, error = %e, "Backend completion notification lost");
            }
        }
    }
}
