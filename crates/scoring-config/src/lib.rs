//! Typed configuration for the scoring API.
//!
//! Configuration is layered: defaults, then a TOML or JSON file, then
//! `SCORING__SECTION__KEY` environment variables. Unknown fields are
//! rejected.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! request_timeout_ms = 30000
//! shutdown_timeout_secs = 30
//! max_body_bytes = 1048576
//!
//! [store]
//! backend = "redis"
//! url = "redis://127.0.0.1:6379/0"
//! connect_timeout_ms = 5000
//! max_retries = 5
//! retry_delay_ms = 2000
//!
//! [auth]
//! salt = "Otus"
//! admin_login = "admin"
//! admin_salt = "42"
//!
//! [telemetry]
//! service_name = "scoring-api"
//!
//! [telemetry.metrics]
//! enabled = false
//! addr = "0.0.0.0:9090"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//! file = "/var/log/scoring.log"
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::ScoringConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{
    AuthConfig, LogFormat, LoggingConfig, MetricsConfig, ServerConfig, StoreBackend, StoreConfig,
    TelemetryConfigSection,
};
