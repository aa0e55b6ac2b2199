//! Structured logging.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and one
//! fmt layer, JSON or pretty, writing to stdout or to an append-only log
//! file.
//!
//! # Example
//!
//! ```rust,ignore
//! use scoring_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! tracing::info!(request_id = %id, code = 200, "request served");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive, e.g. `info` or `scoring_server=debug,info`.
    pub level: String,

    /// JSON output when `true`, pretty output otherwise.
    pub json_format: bool,

    /// Whether to emit ANSI colors. Never applied to a log file.
    pub ansi_enabled: bool,

    /// Whether to include file and line.
    pub include_location: bool,

    /// Append logs to this file instead of stdout.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            ansi_enabled: false,
            include_location: false,
            file: None,
        }
    }
}

impl LogConfig {
    /// Human-readable debug output for local runs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            ansi_enabled: true,
            include_location: true,
            ..Self::default()
        }
    }

    /// Returns a copy that writes to `path`.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }
}

/// Initializes the global logging subscriber.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` for an invalid filter or when a
/// global subscriber is already installed, and `TelemetryError::LogFile`
/// when the log file cannot be opened.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let (writer, ansi) = match &config.file {
        Some(path) => (BoxMakeWriter::new(Mutex::new(open_log_file(path)?)), false),
        None => (BoxMakeWriter::new(std::io::stdout), config.ansi_enabled),
    };

    let layer = if config.json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the directive is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level: {e}")))
}

fn open_log_file(path: &Path) -> TelemetryResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TelemetryError::LogFile {
            path: path.to_path_buf(),
            source,
        })
}
