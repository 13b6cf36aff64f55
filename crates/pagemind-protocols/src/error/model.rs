//! Model backend errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Session creation failed: {0}")]
    SessionCreation(String),

    #[error("Invocation failed: {0}")]
    Invocation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Session already destroyed")]
    SessionDestroyed,
}

impl ModelError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Backend messages are never inspected; classification is by variant only.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::Unavailable(_)
            | ModelError::InvalidRequest(_)
            | ModelError::SessionDestroyed => false,
            ModelError::ApiError { status, .. } => !matches!(status, 400 | 401 | 403 | 404),
            _ => true,
        }
    }
}
