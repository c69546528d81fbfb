//! Notification error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Backend returned HTTP {status}")]
    Status { status: u16 },

    #[error("Invalid notification configuration: {0}")]
    InvalidConfig(String),
}

pub type NotifyResult<T> = Result<T, NotifyError>;
