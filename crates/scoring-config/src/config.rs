//! Root configuration type.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::{AuthConfig, ConfigError, ServerConfig, StoreBackend, StoreConfig, TelemetryConfigSection};

/// Complete scoring service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables over the defaults.
///
/// # Example
///
/// ```
/// use scoring_config::ScoringConfig;
///
/// let config = ScoringConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert_eq!(config.auth.admin_login, "admin");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Cache store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Token authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging and metrics settings.
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,
}

impl ScoringConfig {
    /// Checks values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.store.backend == StoreBackend::Redis && self.store.url.trim().is_empty() {
            return Err(ConfigError::invalid_value("store.url", "must not be empty"));
        }

        if self.telemetry.metrics.enabled
            && self.telemetry.metrics.addr.parse::<SocketAddr>().is_err()
        {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.addr",
                format!("invalid socket address: {}", self.telemetry.metrics.addr),
            ));
        }

        Ok(())
    }

    /// Returns the validated bind address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `server.http_addr` does not parse.
    pub fn http_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.http_addr.parse().map_err(|_| {
            ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            )
        })
    }

    /// Per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    /// Graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

impl StoreConfig {
    /// Connection timeout as a `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Retry delay as a `Duration`.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ScoringConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(config.store.retry_delay(), Duration::from_secs(2));
        assert_eq!(config.store.connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_http_addr() {
        let mut config = ScoringConfig::default();
        config.server.http_addr = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
        assert!(config.http_addr().is_err());
    }

    #[test]
    fn test_zero_body_limit() {
        let mut config = ScoringConfig::default();
        config.server.max_body_bytes = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "server.max_body_bytes"
        ));
    }

    #[test]
    fn test_zero_request_timeout() {
        let mut config = ScoringConfig::default();
        config.server.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_redis_url() {
        let mut config = ScoringConfig::default();
        config.store.url = "  ".to_string();
        assert!(config.validate().is_err());

        config.store.backend = StoreBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_metrics_addr_checked_only_when_enabled() {
        let mut config = ScoringConfig::default();
        config.telemetry.metrics.addr = "nowhere".to_string();
        assert!(config.validate().is_ok());

        config.telemetry.metrics.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_addr_parses() {
        let config = ScoringConfig::default();
        assert_eq!(config.http_addr().unwrap().port(), 8080);
    }
}
