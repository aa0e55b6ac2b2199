//! # Scoring Server
//!
//! HTTP front of the scoring API.
//!
//! - [`Dispatcher`] - validates, authenticates and routes method calls
//! - [`Scorer`] - score and interests lookups over the cache store
//! - [`Server`] - hyper transport for `POST /method`
//! - [`ShutdownSignal`] - graceful shutdown on SIGTERM / Ctrl+C
//!
//! # Example
//!
//! ```rust,ignore
//! use scoring_config::ConfigLoader;
//! use scoring_server::{build_server, Server, ShutdownSignal};
//!
//! let config = ConfigLoader::new().with_env_prefix("SCORING").load()?;
//! let server = build_server(&config).await?;
//! let listener = Server::bind(config.http_addr()?).await?;
//! server.run(listener, ShutdownSignal::with_os_signals()).await;
//! ```

mod app;
pub mod cli;
mod config;
pub mod dispatch;
mod error;
pub mod scoring;
mod server;
pub mod shutdown;

pub use app::{authenticator, build_server, connect_store};
pub use config::ServerSettings;
pub use dispatch::{DispatchStage, Dispatcher, ADMIN_SCORE};
pub use error::{ServerError, ServerResult};
pub use scoring::Scorer;
pub use server::{HttpResponse, ResponseBody, Server, METHOD_PATH, REQUEST_ID_HEADER};
pub use shutdown::ShutdownSignal;

/// Crate version, printed by `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
