//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Launcher error: {0}")]
    Launch(#[from] pgate_launcher::LaunchError),

    #[error("Notification error: {0}")]
    Notify(#[from] pgate_notify::NotifyError),

    #[error("Server error: {0}")]
    Server(String),
}

pub type AppResult<T> = Result<T, AppError>;
