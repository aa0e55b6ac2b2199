//! Configuration section types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// HTTP server section.
///
/// # Example
///
/// ```
/// use scoring_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:8080".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.max_body_bytes, 1024 * 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            request_timeout_ms: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Store backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Redis at `store.url`.
    #[default]
    Redis,
    /// In-process map; data is lost on restart.
    Memory,
}

/// Cache store section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Redis connection URL.
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Initial connection timeout in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Retries after the first attempt of each store operation.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between attempts in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_store_url(),
            connect_timeout_ms: default_connect_timeout(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

fn default_store_url() -> String {
    "redis://127.0.0.1:6379/0".to_string()
}

fn default_connect_timeout() -> u64 {
    5_000
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2_000
}

/// Token authentication section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Salt mixed into regular user tokens.
    #[serde(default = "default_salt")]
    pub salt: String,

    /// Login granted admin rights.
    #[serde(default = "default_admin_login")]
    pub admin_login: String,

    /// Salt mixed into admin tokens.
    #[serde(default = "default_admin_salt")]
    pub admin_salt: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            salt: default_salt(),
            admin_login: default_admin_login(),
            admin_salt: default_admin_salt(),
        }
    }
}

fn default_salt() -> String {
    "Otus".to_string()
}

fn default_admin_login() -> String {
    "admin".to_string()
}

fn default_admin_salt() -> String {
    "42".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Expose a Prometheus endpoint.
    #[serde(default)]
    pub enabled: bool,

    /// Prometheus endpoint address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs.
    #[default]
    Json,
    /// Human-readable pretty format.
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error) or a filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,

    /// Append logs to this file instead of stdout.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
            file: None,
        }
    }
}

impl From<&LoggingConfig> for scoring_telemetry::LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            enabled: config.enabled,
            level: config.level.clone(),
            json_format: config.format == LogFormat::Json,
            ansi_enabled: config.ansi_enabled,
            include_location: config.include_location,
            file: config.file.clone(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telemetry section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfigSection {
    /// Service name for telemetry identification.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TelemetryConfigSection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl From<&TelemetryConfigSection> for scoring_telemetry::TelemetryConfig {
    fn from(section: &TelemetryConfigSection) -> Self {
        Self {
            service_name: section.service_name.clone(),
            logging: (&section.logging).into(),
            metrics: scoring_telemetry::MetricsConfig {
                enabled: section.metrics.enabled,
                addr: section.metrics.addr.clone(),
            },
        }
    }
}

fn default_service_name() -> String {
    "scoring-api".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.shutdown_timeout_secs, 30);
        assert_eq!(config.max_body_bytes, 1_048_576);
    }

    #[test]
    fn test_server_config_deserialize() {
        let toml = r#"
            http_addr = "127.0.0.1:3000"
            max_body_bytes = 4096
        "#;
        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.http_addr, "127.0.0.1:3000");
        assert_eq!(config.max_body_bytes, 4096);
        assert_eq!(config.shutdown_timeout_secs, 30);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
            http_addr = "127.0.0.1:3000"
            max_connections = 10
        "#;
        assert!(toml::from_str::<ServerConfig>(toml).is_err());
    }

    #[test]
    fn test_store_config_default() {
        let config = StoreConfig::default();
        assert_eq!(config.backend, StoreBackend::Redis);
        assert_eq!(config.url, "redis://127.0.0.1:6379/0");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay_ms, 2_000);
        assert_eq!(config.connect_timeout_ms, 5_000);
    }

    #[test]
    fn test_store_backend_deserialize() {
        let backend: StoreBackend = serde_json::from_str(r#""memory""#).unwrap();
        assert_eq!(backend, StoreBackend::Memory);
        assert!(serde_json::from_str::<StoreBackend>(r#""memcached""#).is_err());
    }

    #[test]
    fn test_auth_config_default() {
        let config = AuthConfig::default();
        assert_eq!(config.salt, "Otus");
        assert_eq!(config.admin_login, "admin");
        assert_eq!(config.admin_salt, "42");
    }

    #[test]
    fn test_logging_config_converts() {
        let config = LoggingConfig {
            format: LogFormat::Pretty,
            file: Some(PathBuf::from("scoring.log")),
            ..Default::default()
        };
        let log: scoring_telemetry::LogConfig = (&config).into();
        assert!(!log.json_format);
        assert_eq!(log.file, Some(PathBuf::from("scoring.log")));
        assert_eq!(log.level, "info");
    }

    #[test]
    fn test_telemetry_section_converts() {
        let section = TelemetryConfigSection::default();
        let telemetry: scoring_telemetry::TelemetryConfig = (&section).into();
        assert_eq!(telemetry.service_name, "scoring-api");
        assert!(!telemetry.metrics.enabled);
        assert!(telemetry.logging.json_format);
    }
}
