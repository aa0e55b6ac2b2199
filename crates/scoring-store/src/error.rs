//! Store error types.

use scoring_core::ApiError;
use std::time::Duration;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by a [`Store`](crate::Store).
///
/// Whether an error is worth retrying is decided here, not at the call
/// site; see [`StoreError::is_transient`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or dropped the connection.
    #[error("Store connection error: {0}")]
    Connection(String),

    /// The backend did not answer in time.
    #[error("Store operation `{operation}` timed out after {after:?}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// How long the caller waited.
        after: Duration,
    },

    /// The backend rejected the command.
    #[error("Store command error: {0}")]
    Command(String),

    /// A stored value could not be decoded.
    #[error("Store value for `{key}` could not be decoded: {message}")]
    Decode {
        /// The key holding the value.
        key: String,
        /// What was wrong with the value.
        message: String,
    },
}

impl StoreError {
    /// Creates a decode error for a key.
    #[must_use]
    pub fn decode(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for connectivity faults that may succeed on retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout { .. })
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                operation: "redis",
                after: Duration::ZERO,
            }
        } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped()
        {
            Self::Connection(err.to_string())
        } else {
            Self::Command(err.to_string())
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::internal_with_source("store operation failed", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Connection("refused".into()).is_transient());
        assert!(StoreError::Timeout {
            operation: "get",
            after: Duration::from_millis(100),
        }
        .is_transient());
        assert!(!StoreError::Command("WRONGTYPE".into()).is_transient());
        assert!(!StoreError::decode("i:1", "not a list").is_transient());
    }

    #[test]
    fn test_redis_io_error_is_transient() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = StoreError::from(redis::RedisError::from(io));
        assert!(err.is_transient(), "{err}");
    }

    #[test]
    fn test_redis_response_error_is_fatal() {
        let redis_err = redis::RedisError::from((redis::ErrorKind::TypeError, "bad type"));
        let err = StoreError::from(redis_err);
        assert!(matches!(err, StoreError::Command(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_into_api_error_is_internal() {
        let api = ApiError::from(StoreError::Connection("down".into()));
        assert_eq!(api.code(), 500);
        assert_eq!(api.response_text(), "Internal Server Error");
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::decode("i:7", "expected a list");
        assert_eq!(
            err.to_string(),
            "Store value for `i:7` could not be decoded: expected a list"
        );
    }
}
