//! Redis backend.

use crate::error::{StoreError, StoreResult};
use crate::store::{BoxFuture, Store};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::Client;
use std::time::Duration;

/// A store backed by one multiplexed Redis connection.
///
/// The connection manager reconnects on its own after a dropped connection,
/// so a call that hits a broken connection fails as a transient error and
/// the next attempt gets a fresh one.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connects to `url`, e.g. `redis://127.0.0.1:6379/0`.
    pub async fn connect(url: &str, connect_timeout: Duration) -> StoreResult<Self> {
        let client = Client::open(url).map_err(|e| StoreError::Command(e.to_string()))?;
        // Reconnects are paced by the caller's retry policy.
        let config = ConnectionManagerConfig::new().set_number_of_retries(1);

        let connection =
            tokio::time::timeout(connect_timeout, client.get_connection_manager_with_config(config))
                .await
                .map_err(|_| StoreError::Timeout {
                    operation: "connect",
                    after: connect_timeout,
                })??;

        tracing::info!(url = %redacted(url), "connected to redis");
        Ok(Self { connection })
    }

    async fn get_value(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set_value(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }
        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }
}

impl Store for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Vec<u8>>>> {
        Box::pin(self.get_value(key))
    }

    fn cache_get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Vec<u8>>>> {
        Box::pin(self.get_value(key))
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a [u8]) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(self.set_value(key, value, None))
    }

    fn cache_set<'a>(
        &'a self,
        key: &'a str,
        value: &'a [u8],
        ttl: Duration,
    ) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(self.set_value(key, value, Some(ttl)))
    }
}

/// Strips the password from a connection URL for logging.
fn redacted(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
