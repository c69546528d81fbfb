//! Window opener trait and implementations.
//!
//! The opener is the boundary to whatever actually shows a window. It
//! reports one of three results:
//! - `Ok(Some(handle))`: a window was opened
//! - `Ok(None)`: the host refused to open a window (popup blocked)
//! - `Err(_)`: anything else went wrong

use std::process::Stdio;
use std::sync::Arc;

use parking_lot::Mutex;
use pgate_core::PopupRequest;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{OpenerConfig, OpenerKind};
use crate::error::OpenerError;

/// Handle to an opened popup window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowHandle {
    /// Unique id of this popup instance.
    pub id: Uuid,
    /// Window name (`TradeWindow_<symbol>`).
    pub name: String,
    /// Process id when the window belongs to a spawned process.
    pub pid: Option<u32>,
}

impl WindowHandle {
    pub fn new(name: impl Into<String>, pid: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            pid,
        }
    }
}

/// Opens popup windows.
pub trait WindowOpener: Send + Sync {
    /// Open a popup. `Ok(None)` means the popup was blocked.
    fn open(&self, request: &PopupRequest) -> Result<Option<WindowHandle>, OpenerError>;

    /// Opener name for logging.
    fn name(&self) -> &'static str;
}

/// Build the opener selected by configuration.
pub fn build_opener(config: &OpenerConfig) -> Arc<dyn WindowOpener> {
    match config.kind {
        OpenerKind::Command => Arc::new(CommandOpener::new(
            config.program.clone(),
            config.args.clone(),
        )),
        OpenerKind::Log => Arc::new(LogOpener),
        OpenerKind::Disabled => Arc::new(DisabledOpener),
    }
}

/// Opens popups by spawning an external program (e.g. `xdg-open`, a browser).
///
/// Must be used from within a tokio runtime; the spawned process is reaped
/// by the runtime once it exits.
#[derive(Debug, Clone)]
pub struct CommandOpener {
    program: String,
    args: Vec<String>,
}

impl CommandOpener {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl WindowOpener for CommandOpener {
    fn open(&self, request: &PopupRequest) -> Result<Option<WindowHandle>, OpenerError> {
        let child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(request.url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| OpenerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let pid = child.id();
        debug!(
            program = %self.program,
            pid = ?pid,
            window = %request.window_name,
            "Popup process spawned"
        );
        Ok(Some(WindowHandle::new(request.window_name.clone(), pid)))
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

/// Dry-run opener: logs the popup and reports it as opened.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOpener;

impl WindowOpener for LogOpener {
    fn open(&self, request: &PopupRequest) -> Result<Option<WindowHandle>, OpenerError> {
        info!(
            url = %request.url,
            window = %request.window_name,
            features = %request.features.to_feature_string(),
            "Popup (dry run)"
        );
        Ok(Some(WindowHandle::new(request.window_name.clone(), None)))
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Opener for sessions with popups turned off. Every open is blocked.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledOpener;

impl WindowOpener for DisabledOpener {
    fn open(&self, _request: &PopupRequest) -> Result<Option<WindowHandle>, OpenerError> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Behavior of the mock opener for the next open calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOpenBehavior {
    Open,
    Blocked,
    Fail(String),
}

/// Mock opener for testing.
#[derive(Debug)]
pub struct MockWindowOpener {
    /// Recorded requests for verification.
    requests: Mutex<Vec<PopupRequest>>,
    behavior: Mutex<MockOpenBehavior>,
}

impl Default for MockWindowOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWindowOpener {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            behavior: Mutex::new(MockOpenBehavior::Open),
        }
    }

    pub fn set_behavior(&self, behavior: MockOpenBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// Get recorded requests (including blocked and failed ones).
    pub fn requests(&self) -> Vec<PopupRequest> {
        self.requests.lock().clone()
    }

    pub fn open_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl WindowOpener for MockWindowOpener {
    fn open(&self, request: &PopupRequest) -> Result<Option<WindowHandle>, OpenerError> {
        self.requests.lock().push(request.clone());
        match self.behavior.lock().clone() {
            MockOpenBehavior::Open => Ok(Some(WindowHandle::new(request.window_name.clone(), None))),
            MockOpenBehavior::Blocked => Ok(None),
            MockOpenBehavior::Fail(reason) => Err(OpenerError::Other(reason)),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgate_core::{Signal, WindowFeatures};
    use url::Url;

    fn request() -> PopupRequest {
        let base = Url::parse("http://127.0.0.1:8080").unwrap();
        PopupRequest::build(
            &base,
            &Signal::new("BTCUSD", "BINANCE").with_signal("BUY"),
            WindowFeatures::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_log_opener_reports_window() {
        let handle = LogOpener.open(&request()).unwrap().unwrap();
        assert_eq!(handle.name, "TradeWindow_BTCUSD");
        assert!(handle.pid.is_none());
    }

    #[test]
    fn test_disabled_opener_blocks() {
        assert!(DisabledOpener.open(&request()).unwrap().is_none());
    }

    #[test]
    fn test_build_opener_by_kind() {
        let mut config = OpenerConfig::default();
        assert_eq!(build_opener(&config).name(), "command");
        config.kind = OpenerKind::Log;
        assert_eq!(build_opener(&config).name(), "log");
        config.kind = OpenerKind::Disabled;
        assert_eq!(build_opener(&config).name(), "disabled");
    }

    #[tokio::test]
    async fn test_command_opener_missing_program() {
        let opener = CommandOpener::new("pgate-no-such-program-for-tests", Vec::new());
        let err = opener.open(&request()).unwrap_err();
        assert!(matches!(err, OpenerError::Spawn { .. }));
    }

    #[test]
    fn test_mock_opener_behaviors() {
        let opener = MockWindowOpener::new();
        assert!(opener.open(&request()).unwrap().is_some());

        opener.set_behavior(MockOpenBehavior::Blocked);
        assert!(opener.open(&request()).unwrap().is_none());

        opener.set_behavior(MockOpenBehavior::Fail("boom".to_string()));
        assert!(opener.open(&request()).is_err());

        assert_eq!(opener.open_count(), 3);
    }
}
