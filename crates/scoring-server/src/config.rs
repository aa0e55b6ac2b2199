//! Transport settings.

use std::time::Duration;

/// Limits applied by the HTTP transport to every request.
///
/// # Example
///
/// ```rust
/// use scoring_server::ServerSettings;
/// use std::time::Duration;
///
/// let settings = ServerSettings::default().with_max_body_bytes(4096);
/// assert_eq!(settings.max_body_bytes, 4096);
/// assert_eq!(settings.request_timeout, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Time allowed for reading the body and for dispatch, each.
    pub request_timeout: Duration,
    /// Time allowed for open connections to finish after shutdown.
    pub shutdown_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerSettings {
    /// Sets the body size limit.
    pub const fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Sets the per-request timeout.
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the shutdown timeout.
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl From<&scoring_config::ScoringConfig> for ServerSettings {
    fn from(config: &scoring_config::ScoringConfig) -> Self {
        Self {
            max_body_bytes: config.server.max_body_bytes,
            request_timeout: config.request_timeout(),
            shutdown_timeout: config.shutdown_timeout(),
        }
    }
}
