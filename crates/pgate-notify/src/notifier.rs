//! Backend completion notifier.
//!
//! Provides a trait-based abstraction for delivering completion events so the
//! listener can be tested without a backend.

use std::future::Future;
use std::pin::Pin;

use parking_lot::Mutex;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::NotifyConfig;
use crate::error::{NotifyError, NotifyResult};

/// Backend endpoint receiving completion events.
pub const COMPLETION_PATH: &str = "/api/trade-completed";

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Delivers completion events to the backend.
pub trait CompletionNotifier: Send + Sync {
    /// Deliver `payload` unmodified.
    fn notify(&self, payload: Value) -> BoxFuture<'_, NotifyResult<()>>;
}

/// Notifier posting JSON to `<backend_url>/api/trade-completed`.
pub struct HttpNotifier {
    client: Client,
    endpoint: Url,
}

impl HttpNotifier {
    /// Create a notifier from configuration.
    pub fn new(config: &NotifyConfig) -> NotifyResult<Self> {
        let base = Url::parse(&config.backend_url).map_err(|e| {
            NotifyError::InvalidConfig(format!("notify.backend_url {:?}: {e}", config.backend_url))
        })?;
        let endpoint = base
            .join(COMPLETION_PATH)
            .map_err(|e| NotifyError::InvalidConfig(format!("notify.backend_url: {e}")))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| NotifyError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl CompletionNotifier for HttpNotifier {
    fn notify(&self, payload: Value) -> BoxFuture<'_, NotifyResult<()>> {
        Box::pin(async move {
            // `.json()` sets Content-Type: application/json
            let response = self
                .client
                .post(self.endpoint.clone())
                .json(&payload)
                .send()
                .await
                .map_err(|e| NotifyError::HttpClient(format!("HTTP request failed: {e}")))?;

            let status = response.status();
            debug!(endpoint = %self.endpoint, status = status.as_u16(), "Completion delivered");
            if !status.is_success() {
                return Err(NotifyError::Status {
                    status: status.as_u16(),
                });
            }
            Ok(())
        })
    }
}

/// Mock notifier for testing.
#[derive(Debug, Default)]
pub struct MockNotifier {
    /// Recorded payloads for verification.
    payloads: Mutex<Vec<Value>>,
    /// Status to fail with, if any.
    fail_status: Mutex<Option<u16>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deliveries fail with `status`.
    pub fn fail_with(&self, status: u16) {
        *self.fail_status.lock() = Some(status);
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.payloads.lock().clone()
    }
}

impl CompletionNotifier for MockNotifier {
    fn notify(&self, payload: Value) -> BoxFuture<'_, NotifyResult<()>> {
        Box::pin(async move {
            self.payloads.lock().push(payload);
            match *self.fail_status.lock() {
                Some(status) => Err(NotifyError::Status { status }),
                None => Ok(()),
            }
        })
    }
}
