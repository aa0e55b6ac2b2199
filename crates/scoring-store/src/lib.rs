//! # Scoring Store
//!
//! Cache access for the scoring API.
//!
//! - [`Store`] - the async key-value seam handlers depend on
//! - [`ResilientStore`] - applies a [`RetryPolicy`] to any store
//! - [`RedisStore`] - Redis backend over a `ConnectionManager`
//! - [`MemoryStore`] - in-process backend for development and tests
//!
//! Errors carry their own retry classification: [`StoreError::is_transient`]
//! is `true` for connection faults and timeouts only.

#![forbid(unsafe_code)]

mod error;
mod memory;
mod redis_store;
mod resilient;
mod retry;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use resilient::ResilientStore;
pub use retry::{RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
pub use store::{BoxFuture, Store};
