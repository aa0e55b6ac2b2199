//! Startup errors.
//!
//! Only these end the process; failures of individual calls are
//! [`ApiError`](scoring_core::ApiError)s and become responses.

use std::net::SocketAddr;

use scoring_config::ConfigError;
use scoring_store::StoreError;
use scoring_telemetry::TelemetryError;
use thiserror::Error;

/// Result type for server setup.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging or metrics could not be initialized.
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// The store could not be reached at startup.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The listen address could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// The requested address.
        addr: SocketAddr,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Command-line arguments were not understood.
    #[error("{0}")]
    Usage(String),
}
