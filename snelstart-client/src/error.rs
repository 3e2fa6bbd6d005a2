//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network / transport failure (connect, timeout, broken body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the API
    #[error("SnelStart returned {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx response that could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client could not be constructed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status code, when the API answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the same request may succeed later
    ///
    /// 408 / 429 / 5xx and transport errors are transient; other 4xx mean the
    /// request itself is wrong.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_decode() && !e.is_builder(),
            Self::Status { status, .. } => is_retryable_status(*status),
            Self::InvalidResponse(_) | Self::Config(_) => false,
        }
    }
}

/// 408, 429 and 5xx are worth retrying
pub fn is_retryable_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..600).contains(&status)
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(408));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(422));
    }

    #[test]
    fn test_error_retryable() {
        let transient = ClientError::Status { status: 502, body: String::new() };
        let permanent = ClientError::Status { status: 400, body: "bad".into() };
        assert!(transient.is_retryable());
        assert!(!permanent.is_retryable());
        assert_eq!(permanent.status(), Some(400));
        assert!(!ClientError::InvalidResponse("x".into()).is_retryable());
    }
}
