//! Launcher error types.

use thiserror::Error;

/// User alert shown when the popup was blocked.
pub const POPUP_BLOCKED_ALERT: &str = "Popup blocked. Please allow popups for this site.";

/// User alert shown for any other open failure.
pub const OPEN_FAILURE_ALERT: &str = "Could not open trade popup. Please check browser settings.";

/// Failure to open a popup. Registry state is never changed when one of
/// these is returned.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Popup blocked for {symbol}")]
    PopupBlocked { symbol: String },

    #[error("Failed to open trade popup for {symbol}: {reason}")]
    UnexpectedOpenFailure { symbol: String, reason: String },

    #[error("Invalid launcher configuration: {0}")]
    InvalidConfig(String),
}

impl LaunchError {
    /// Alert text for the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PopupBlocked { .. } => POPUP_BLOCKED_ALERT,
            Self::UnexpectedOpenFailure { .. } | Self::InvalidConfig(_) => OPEN_FAILURE_ALERT,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PopupBlocked { .. } => "blocked",
            Self::UnexpectedOpenFailure { .. } => "unexpected",
            Self::InvalidConfig(_) => "config",
        }
    }
}

pub type LaunchResult<T> = Result<T, LaunchError>;

/// Window opener failure.
#[derive(Debug, Error)]
pub enum OpenerError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Opener failed: {0}")]
    Other(String),
}
