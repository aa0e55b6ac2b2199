//! The key-value store seam.
//!
//! Handlers talk to the cache only through [`Store`]. Implementations return
//! boxed futures so the trait stays object safe and a server can hold an
//! `Arc<dyn Store>` regardless of the backend chosen at startup.
//!
//! # Example
//!
//! ```
//! use scoring_store::{MemoryStore, Store};
//!
//! # async fn demo() -> Result<(), scoring_store::StoreError> {
//! let store = MemoryStore::new();
//! store.set("i:1", b"[\"books\"]").await?;
//! assert!(store.get("i:1").await?.is_some());
//! # Ok(())
//! # }
//! ```

use crate::error::StoreResult;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A best-effort key-value cache.
///
/// `get` and `set` address persistent values; `cache_get` and `cache_set`
/// address values the caller is prepared to lose. Backends may serve both
/// from the same keyspace.
pub trait Store: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Reads a value.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Vec<u8>>>>;

    /// Reads a cached value.
    fn cache_get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Vec<u8>>>>;

    /// Writes a value without expiry.
    fn set<'a>(&'a self, key: &'a str, value: &'a [u8]) -> BoxFuture<'a, StoreResult<()>>;

    /// Writes a cached value that expires after `ttl`.
    fn cache_set<'a>(
        &'a self,
        key: &'a str,
        value: &'a [u8],
        ttl: Duration,
    ) -> BoxFuture<'a, StoreResult<()>>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Vec<u8>>>> {
        (**self).get(key)
    }

    fn cache_get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<Vec<u8>>>> {
        (**self).cache_get(key)
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a [u8]) -> BoxFuture<'a, StoreResult<()>> {
        (**self).set(key, value)
    }

    fn cache_set<'a>(
        &'a self,
        key: &'a str,
        value: &'a [u8],
        ttl: Duration,
    ) -> BoxFuture<'a, StoreResult<()>> {
        (**self).cache_set(key, value, ttl)
    }
}
