//! Integration tests for the store backends behind `ResilientStore`.
//!
//! The Redis tests need a server at `SCORING_TEST_REDIS_URL`
//! (default `redis://127.0.0.1:6379/15`) and are ignored by default:
//!
//! ```text
//! cargo test -p scoring-store -- --ignored
//! ```

use scoring_store::{MemoryStore, RedisStore, ResilientStore, RetryPolicy, Store};
use std::sync::Arc;
use std::time::Duration;

fn redis_url() -> String {
    std::env::var("SCORING_TEST_REDIS_URL")
        .unwrap_or_else(|_| "redis://127.0.0.1:6379/15".to_string())
}

async fn redis_store() -> ResilientStore<RedisStore> {
    let backend = RedisStore::connect(&redis_url(), Duration::from_secs(2))
        .await
        .expect("redis should be reachable for ignored tests");
    ResilientStore::new(backend, RetryPolicy::new(2, Duration::from_millis(50)))
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn redis_cache_set_then_get() {
    let store = redis_store().await;
    store
        .cache_set("scoring-test:key", b"value", Duration::from_secs(3600))
        .await
        .unwrap();

    assert_eq!(
        store.cache_get("scoring-test:key").await.unwrap().as_deref(),
        Some(&b"value"[..])
    );
    assert_eq!(
        store.get("scoring-test:key").await.unwrap().as_deref(),
        Some(&b"value"[..])
    );
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn redis_cache_entry_expires() {
    let store = redis_store().await;
    store
        .cache_set("scoring-test:short", b"1", Duration::from_secs(1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(store.cache_get("scoring-test:short").await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn redis_missing_key_is_none() {
    let store = redis_store().await;
    assert_eq!(store.get("scoring-test:absent").await.unwrap(), None);
}

#[tokio::test]
async fn redis_connect_to_closed_port_fails_transiently() {
    let err = RedisStore::connect("redis://127.0.0.1:9/", Duration::from_millis(500))
        .await
        .unwrap_err();
    assert!(err.is_transient(), "{err}");
}

#[tokio::test]
async fn shared_store_behind_dyn_handle() {
    let store: Arc<dyn Store> = Arc::new(ResilientStore::new(
        MemoryStore::new(),
        RetryPolicy::default(),
    ));

    let writer = Arc::clone(&store);
    tokio::spawn(async move { writer.set("i:1", br#"["books","music"]"#).await })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(store.name(), "memory");
    assert_eq!(
        store.get("i:1").await.unwrap().as_deref(),
        Some(&br#"["books","music"]"#[..])
    );
}
