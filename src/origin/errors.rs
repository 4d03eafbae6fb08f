//! Origin Fetch Error Types
//!
//! Structured error handling for origin fetches. Maps HTTP status codes and
//! transport failures to specific error variants.

/// Origin fetch error types
#[derive(Debug, thiserror::Error)]
pub enum OriginError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limited by origin")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({0}): {1}")]
    Server(u16, String),

    #[error("Request error: {0}")]
    Request(String),
}

impl OriginError {
    /// Create an OriginError from a non-success HTTP status and response body
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            403 => OriginError::Forbidden(body.to_string()),
            404 => OriginError::NotFound(body.to_string()),
            408 => OriginError::Timeout,
            429 => OriginError::RateLimited,
            500..=599 => OriginError::Server(status, body.to_string()),
            _ => OriginError::Request(format!("HTTP {}: {}", status, body)),
        }
    }

    /// Map a reqwest transport failure to an OriginError
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OriginError::Timeout
        } else if err.is_connect() {
            OriginError::Network(err.to_string())
        } else {
            OriginError::Request(err.to_string())
        }
    }
}
