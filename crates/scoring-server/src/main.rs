//! scoring-api - entry point.

use scoring_config::{ConfigLoader, ScoringConfig, DEFAULT_ENV_PREFIX};
use scoring_server::cli::{Args, Command, HELP};
use scoring_server::{build_server, Server, ServerResult, ShutdownSignal, VERSION};
use scoring_telemetry::{init_telemetry, TelemetryConfig};

fn load_config(args: &Args) -> ServerResult<ScoringConfig> {
    let mut loader = ConfigLoader::new().with_dotenv()?;
    if let Some(path) = &args.config {
        loader = loader.with_file(path)?;
    }

    let mut config = loader.with_env_prefix(DEFAULT_ENV_PREFIX).load()?;
    args.apply(&mut config)?;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    let args = match Args::parse_from(std::env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            println!("{HELP}");
            return;
        }
        Ok(Command::Version) => {
            println!("scoring-api {VERSION}");
            return;
        }
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Use --help for usage information");
            std::process::exit(2);
        }
    };

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_telemetry(&TelemetryConfig::from(&config.telemetry)) {
        eprintln!("Failed to initialize telemetry: {e}");
        std::process::exit(1);
    }

    tracing::info!(
        version = VERSION,
        http_addr = %config.server.http_addr,
        store = ?config.store.backend,
        "starting scoring-api"
    );

    let server = match build_server(&config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect the store");
            std::process::exit(1);
        }
    };

    let listener = match config.http_addr() {
        Ok(addr) => Server::bind(addr).await,
        Err(e) => Err(e.into()),
    };
    let listener = match listener {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    server.run(listener, ShutdownSignal::with_os_signals()).await;
}
