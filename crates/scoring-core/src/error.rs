//! Error types for the scoring API.
//!
//! [`ApiError`] is the one error type a method call can end in. Each variant
//! belongs to an [`ErrorCategory`], which fixes the numeric response code and
//! the generic text sent when the error carries no client-facing message.
//!
//! | `ErrorCategory` | Code | Generic text |
//! |---|---|---|
//! | `BadRequest` | 400 | `Bad Request` |
//! | `Forbidden` | 403 | `Forbidden` |
//! | `NotFound` | 404 | `Not Found` |
//! | `InvalidRequest` | 422 | `Invalid Request` |
//! | `Internal` | 500 | `Internal Server Error` |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::SchemaError;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Categories of errors, one per response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The body could not be read or is not a JSON object.
    BadRequest,
    /// The caller failed authentication.
    Forbidden,
    /// Unknown route or unknown method.
    NotFound,
    /// A field or cross-field check failed.
    InvalidRequest,
    /// An unexpected fault while serving the call.
    Internal,
}

impl ErrorCategory {
    /// Returns the HTTP status code for this category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidRequest => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the numeric code placed in the response body.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.default_status_code().as_u16()
    }

    /// Returns the generic response text.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::BadRequest => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::InvalidRequest => "Invalid Request",
            Self::Internal => "Internal Server Error",
        }
    }
}

/// Outcome of a failed method call.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request body is unreadable or not a JSON object.
    #[error("Malformed body: {message}")]
    MalformedBody {
        /// Description of what was wrong with the body.
        message: String,
    },

    /// A field of the envelope or of the method arguments failed validation.
    #[error(transparent)]
    Validation(#[from] SchemaError),

    /// The arguments are individually valid but fail a cross-field check.
    #[error("{message}")]
    InvalidArguments {
        /// Client-facing message.
        message: String,
    },

    /// The token did not match.
    #[error("Forbidden")]
    Forbidden,

    /// The request path is not served.
    #[error("Unknown route: {path}")]
    UnknownRoute {
        /// The requested path.
        path: String,
    },

    /// The envelope names a method that does not exist.
    #[error("Unknown method: {method}")]
    UnknownMethod {
        /// The requested method name.
        method: String,
    },

    /// Internal fault; details are never sent to the client.
    #[error("Internal error: {message}")]
    Internal {
        /// Description for logs.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ApiError {
    /// Creates a malformed body error.
    #[must_use]
    pub fn malformed_body(message: impl Into<String>) -> Self {
        Self::MalformedBody {
            message: message.into(),
        }
    }

    /// Creates a cross-field validation error.
    #[must_use]
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }

    /// Creates an unknown route error.
    #[must_use]
    pub fn unknown_route(path: impl Into<String>) -> Self {
        Self::UnknownRoute { path: path.into() }
    }

    /// Creates an unknown method error.
    #[must_use]
    pub fn unknown_method(method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            method: method.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedBody { .. } => ErrorCategory::BadRequest,
            Self::Validation(_) | Self::InvalidArguments { .. } => ErrorCategory::InvalidRequest,
            Self::Forbidden => ErrorCategory::Forbidden,
            Self::UnknownRoute { .. } | Self::UnknownMethod { .. } => ErrorCategory::NotFound,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns the numeric response code.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.category().code()
    }

    /// Returns the client-facing message, if this error has one.
    ///
    /// Only validation failures explain themselves; every other error is
    /// answered with its category's generic text.
    #[must_use]
    pub fn response_message(&self) -> Option<String> {
        match self {
            Self::Validation(err) => Some(err.to_string()),
            Self::InvalidArguments { message } => Some(message.clone()),
            _ => None,
        }
    }

    /// Returns the text sent in the response `error` field.
    #[must_use]
    pub fn response_text(&self) -> String {
        self.response_message()
            .unwrap_or_else(|| self.category().reason().to_string())
    }
}
