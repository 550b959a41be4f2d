//! Error types for the GiveHub client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Normalized error for every remote operation.
///
/// Callers never see a raw transport failure; everything a request can do
/// wrong collapses into one of these, and `Display` is the user-facing
/// message the UI shows.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Credentials rejected or token not accepted (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Rejected input (400/409/422)
    #[error("{0}")]
    Validation(String),

    /// Rate limit exceeded (429)
    #[error("Too many requests, retry later")]
    RateLimited,

    /// Server error (5xx)
    #[error("Server error: {0}")]
    Server(String),

    /// Transport failure (connection refused, timeout, TLS, ...)
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::RateLimited | ApiError::Server(_) => true,
            ApiError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Map an HTTP status plus the server's error message to a variant.
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        let message = if message.is_empty() {
            format!("Request failed with status {}", status)
        } else {
            message
        };

        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            400 | 409 | 422 => ApiError::Validation(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::Server(message),
            _ => ApiError::Other(message),
        }
    }
}
