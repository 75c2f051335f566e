//! Error types for the market-data layer.
//!
//! Library code returns [`Result<T>`]; the binary and the HTTP server wrap
//! these in `anyhow` with context.

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    /// Transport-level failure from `reqwest` (connect, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote backend answered with an unexpected status.
    #[error("HTTP {status}: {body}")]
    RemoteStatus { status: StatusCode, body: String },

    /// The remote backend answered with an `{"error": "..."}` body.
    #[error("Remote backend error: {0}")]
    Remote(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl PulseError {
    /// 429 and 5xx responses are worth another attempt; everything else is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            PulseError::Http(e) => e.is_timeout() || e.is_connect(),
            PulseError::RemoteStatus { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PulseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let busy = PulseError::RemoteStatus {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: String::new(),
        };
        let down = PulseError::RemoteStatus {
            status: StatusCode::BAD_GATEWAY,
            body: String::new(),
        };
        let missing = PulseError::RemoteStatus {
            status: StatusCode::NOT_FOUND,
            body: "nope".to_string(),
        };

        assert!(busy.is_retryable());
        assert!(down.is_retryable());
        assert!(!missing.is_retryable());
        assert!(!PulseError::Remote("session expired".to_string()).is_retryable());
    }

    #[test]
    fn test_display_includes_status_and_body() {
        let err = PulseError::RemoteStatus {
            status: StatusCode::NOT_FOUND,
            body: "no such route".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404 Not Found: no such route");
    }
}
