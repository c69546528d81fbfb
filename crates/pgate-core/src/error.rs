//! Error types for pgate-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
