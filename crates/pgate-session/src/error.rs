//! Session error types.

use pgate_launcher::LaunchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Launch failed: {0}")]
    Launch(#[from] LaunchError),

    #[error("Session closed")]
    Closed,
}

pub type SessionResult<T> = Result<T, SessionError>;
