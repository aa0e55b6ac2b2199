//! Command-line arguments of the `scoring-api` binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use scoring_config::{ConfigError, ScoringConfig};

use crate::error::{ServerError, ServerResult};

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the server.
    Run(Args),
    /// Print usage and exit.
    Help,
    /// Print the version and exit.
    Version,
}

/// Options for [`Command::Run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    /// Overrides the port of `server.http_addr`.
    pub port: Option<u16>,
    /// Overrides `telemetry.logging.file`.
    pub log: Option<PathBuf>,
    /// Configuration file to load.
    pub config: Option<PathBuf>,
}

impl Args {
    /// Parses arguments, excluding the program name.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Usage` for unknown flags, missing values and
    /// unparsable ports.
    pub fn parse_from<I, S>(args: I) -> ServerResult<Command>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let mut parsed = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--port" | "-p" => {
                    let value = required_value(&arg, args.next())?;
                    let port = value
                        .parse()
                        .map_err(|_| ServerError::Usage(format!("Invalid port: {value}")))?;
                    parsed.port = Some(port);
                }
                "--log" | "-l" => {
                    parsed.log = Some(PathBuf::from(required_value(&arg, args.next())?));
                }
                "--config" | "-c" => {
                    parsed.config = Some(PathBuf::from(required_value(&arg, args.next())?));
                }
                "--help" | "-h" => return Ok(Command::Help),
                "--version" | "-v" => return Ok(Command::Version),
                other => return Err(ServerError::Usage(format!("Unknown argument: {other}"))),
            }
        }

        Ok(Command::Run(parsed))
    }

    /// Applies the overrides to a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a port is given but
    /// `server.http_addr` is not a socket address.
    pub fn apply(&self, config: &mut ScoringConfig) -> Result<(), ConfigError> {
        if let Some(port) = self.port {
            let mut addr: SocketAddr = config.http_addr()?;
            addr.set_port(port);
            config.server.http_addr = addr.to_string();
        }
        if let Some(log) = &self.log {
            config.telemetry.logging.file = Some(log.clone());
        }
        Ok(())
    }
}

fn required_value(flag: &str, value: Option<String>) -> ServerResult<String> {
    value.ok_or_else(|| ServerError::Usage(format!("Missing value for {flag}")))
}

/// Usage text printed by `--help`.
pub const HELP: &str = r"scoring-api - JSON-over-HTTP scoring service

USAGE:
    scoring-api [OPTIONS]

OPTIONS:
    -p, --port <PORT>      Port to listen on (overrides server.http_addr)
    -l, --log <PATH>       Append logs to this file instead of stdout
    -c, --config <PATH>    Configuration file (TOML or JSON)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    SCORING__SERVER__HTTP_ADDR         Listen address (default: 0.0.0.0:8080)
    SCORING__STORE__BACKEND            redis or memory (default: redis)
    SCORING__STORE__URL                Redis URL (default: redis://127.0.0.1:6379/0)
    SCORING__STORE__MAX_RETRIES        Retries per store operation (default: 5)
    SCORING__STORE__RETRY_DELAY_MS     Pause between retries (default: 2000)
    SCORING__TELEMETRY__LOGGING__LEVEL Log filter (default: info)

Variables may also be set in a .env file in the working directory.
";
