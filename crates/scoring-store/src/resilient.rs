//! Retrying wrapper around any [`Store`].

use crate::error::StoreResult;
use crate::retry::RetryPolicy;
use crate::store::{BoxFuture, Store};
use scoring_telemetry::metrics::record_store_retry;
use std::time::Duration;

/// Applies one [`RetryPolicy`] to every operation of the wrapped store.
///
/// Transient errors are retried after the policy delay; fatal errors and the
/// last transient error are returned unchanged. The delay is an async sleep,
/// so only the call being retried waits.
#[derive(Debug)]
pub struct ResilientStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: Store> ResilientStore<S> {
    /// Wraps a store.
    pub const fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns the retry policy.
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Returns the wrapped store.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    async fn with_retry<'a, T, F>(&'a self, operation: &'static str, mut attempt: F) -> StoreResult<T>
    where
        T: Send,
        F: FnMut() -> BoxFuture<'a, StoreResult<T>> + Send,
    {
        let max_attempts = self.policy.max_attempts();
        let mut tries = 1;

        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && tries < max_attempts => {
                    tracing::warn!(
                        store = self.inner.name(),
                        operation,
                        attempt = tries,
                        error = %err,
                        "transient store error, retrying"
                    );
                    record_store_retry(operation);
                    tries += 1;
                    tokio::time::sleep(self.policy.delay()).await;
                }
                Err(err) => {
                    if err.is_transient() {
                        tracing::error!(
                            store = self.inner.name(),
                            operation,
                            attempts = tries,
                            error = %err,
                            "store retries exhausted"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}

impl<S: Store> Store for ResilientStore<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Vec<u8>>>> {
        Box::pin(self.with_retry("get", move || self.inner.get(key)))
    }

    fn cache_get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Vec<u8>>>> {
        Box::pin(self.with_retry("cache_get", move || self.inner.cache_get(key)))
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a [u8]) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(self.with_retry("set", move || self.inner.set(key, value)))
    }

    fn cache_set<'a>(
        &'a self,
        key: &'a str,
        value: &'a [u8],
        ttl: Duration,
    ) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(self.with_retry("cache_set", move || {
            self.inner.cache_set(key, value, ttl)
        }))
    }
}
