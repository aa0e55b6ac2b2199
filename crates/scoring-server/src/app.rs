//! Wiring from configuration to a ready [`Server`].

use std::sync::Arc;

use scoring_config::{AuthConfig, ScoringConfig, StoreBackend, StoreConfig};
use scoring_core::Authenticator;
use scoring_store::{MemoryStore, RedisStore, ResilientStore, RetryPolicy, Store};

use crate::config::ServerSettings;
use crate::dispatch::Dispatcher;
use crate::error::ServerResult;
use crate::server::Server;

/// Builds the authenticator from the `auth` section.
pub fn authenticator(config: &AuthConfig) -> Authenticator {
    Authenticator::new(&config.salt, &config.admin_login, &config.admin_salt)
}

/// Opens the configured store behind the retry policy.
///
/// # Errors
///
/// Returns `ServerError::Store` if Redis cannot be reached within the
/// connect timeout.
pub async fn connect_store(config: &StoreConfig) -> ServerResult<Arc<dyn Store>> {
    let policy = RetryPolicy::new(config.max_retries, config.retry_delay());

    let store: Arc<dyn Store> = match config.backend {
        StoreBackend::Redis => {
            let redis = RedisStore::connect(&config.url, config.connect_timeout()).await?;
            Arc::new(ResilientStore::new(redis, policy))
        }
        StoreBackend::Memory => Arc::new(ResilientStore::new(MemoryStore::new(), policy)),
    };

    tracing::info!(
        backend = store.name(),
        max_retries = policy.max_retries(),
        retry_delay_ms = u64::try_from(policy.delay().as_millis()).unwrap_or(u64::MAX),
        "store ready"
    );
    Ok(store)
}

/// Builds a server from configuration, connecting the store.
///
/// # Errors
///
/// Returns `ServerError::Store` if the store is unreachable.
pub async fn build_server(config: &ScoringConfig) -> ServerResult<Server> {
    let store = connect_store(&config.store).await?;
    let dispatcher = Dispatcher::new(authenticator(&config.auth), store);
    Ok(Server::new(dispatcher, ServerSettings::from(config)))
}
