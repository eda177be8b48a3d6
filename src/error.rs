//! Error types for Settee operations.
//!
//! Every failure an operation can meet is expressed as a [`SetteeError`] and is
//! delivered through the operation's `process_response` hook. Nothing is raised
//! across task boundaries: the queue only ever observes normal task completion.
//!
//! # Error Categories
//!
//! | Category | Variants | Network attempted |
//! |----------|----------|-------------------|
//! | Addressing | `UrlGeneration`, `MalformedUrl`, `InvalidContentType` | No |
//! | Transport | `Transport`, `Timeout`, `Cancelled` | Yes |
//! | Payload | `Validation`, `Serialization`, `UnexpectedStatus` | Depends |
//! | Setup | `Config` | No |
//!
//! # Examples
//!
//! ```
//! use settee::SetteeError;
//!
//! let err = SetteeError::UrlGeneration("not a url".into());
//! assert!(err.to_string().contains("not a url"));
//! assert!(!err.is_retryable());
//!
//! assert!(SetteeError::Cancelled.is_cancellation());
//! ```

use thiserror::Error;

/// Result type for Settee operations.
pub type Result<T> = std::result::Result<T, SetteeError>;

/// Errors that can occur while building, executing or interpreting a request.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SetteeError {
    /// The root address could not be combined with the path and query.
    #[error("URL generation failed: {0}")]
    UrlGeneration(String),

    /// An address supplied by the caller could not be parsed.
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    /// The declared content type is not a valid header value.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Network-level failure (connection reset, TLS, DNS, broken body stream).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request did not finish within its timeout.
    #[error("Request timed out")]
    Timeout,

    /// The transport task was cancelled before it finished.
    #[error("Request cancelled")]
    Cancelled,

    /// The operation rejected its own inputs before any request was built.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server answered with a status the operation does not accept.
    #[error("Unexpected status {status}: {reason}")]
    UnexpectedStatus {
        /// HTTP status code of the response.
        status: u16,
        /// Reason reported by the server, or the raw body.
        reason: String,
    },

    /// The client or a task is not set up to run.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SetteeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SetteeError::Timeout
        } else {
            SetteeError::Transport(err.to_string())
        }
    }
}

impl SetteeError {
    /// Check if this error reports a cancelled transport task.
    #[inline]
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SetteeError::Cancelled)
    }

    /// Check if resubmitting the same operation could succeed.
    ///
    /// Only transient network conditions qualify. The request pipeline never
    /// retries on its own; this is a hint for callers.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            SetteeError::Timeout | SetteeError::Transport(_) => true,
            SetteeError::UnexpectedStatus { status, .. } => {
                crate::client::is_retryable_status(*status)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_retryable() {
        assert!(SetteeError::Timeout.is_retryable());
    }

    #[test]
    fn test_url_generation_not_retryable() {
        assert!(!SetteeError::UrlGeneration("bad".into()).is_retryable());
    }

    #[test]
    fn test_unexpected_503_is_retryable() {
        let err = SetteeError::UnexpectedStatus {
            status: 503,
            reason: "unavailable".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_unexpected_409_not_retryable() {
        let err = SetteeError::UnexpectedStatus {
            status: 409,
            reason: "conflict".into(),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("409"));
    }

    #[test]
    fn test_cancellation() {
        assert!(SetteeError::Cancelled.is_cancellation());
        assert!(!SetteeError::Timeout.is_cancellation());
    }

    #[test]
    fn test_serialization_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SetteeError = json_err.into();
        assert!(matches!(err, SetteeError::Serialization(_)));
    }
}
