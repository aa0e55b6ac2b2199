//! Score and interests lookups backed by the cache store.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};

use scoring_core::{ClientId, OnlineScoreRequest};
use scoring_store::{Store, StoreError, StoreResult};

/// How long a computed score stays cached.
pub const SCORE_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Computes scores and reads client interests.
///
/// Score caching is best effort: a failing cache read counts as a miss and a
/// failing cache write is skipped. Interests have no fallback, so their
/// store errors reach the caller.
#[derive(Clone)]
pub struct Scorer {
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scorer")
            .field("store", &self.store.name())
            .finish()
    }
}

impl Scorer {
    /// Creates a scorer over a shared store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Returns the score for a set of personal details.
    pub async fn get_score(&self, request: &OnlineScoreRequest) -> f64 {
        let key = score_cache_key(request);

        match self.store.cache_get(&key).await {
            Ok(Some(raw)) => match parse_cached_score(&raw) {
                Some(score) => return score,
                None => tracing::warn!(key = %key, "ignoring unreadable cached score"),
            },
            Ok(None) => {}
            Err(err) => tracing::warn!(key = %key, error = %err, "score cache read failed"),
        }

        let score = compute_score(request);

        if let Err(err) = self
            .store
            .cache_set(&key, score.to_string().as_bytes(), SCORE_CACHE_TTL)
            .await
        {
            tracing::warn!(key = %key, error = %err, "score cache write failed");
        }

        score
    }

    /// Returns the interests stored for a client, or none if nothing is
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns the store error, or `StoreError::Decode` when the stored value
    /// is not a JSON list of strings.
    pub async fn get_interests(&self, client_id: ClientId) -> StoreResult<Vec<String>> {
        let key = interests_key(client_id);

        match self.store.get(&key).await? {
            Some(raw) => {
                serde_json::from_slice(&raw).map_err(|e| StoreError::decode(key, e.to_string()))
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Sums the weights of the supplied details.
#[must_use]
pub fn compute_score(request: &OnlineScoreRequest) -> f64 {
    let mut score = 0.0;
    if request.phone.is_some() {
        score += 1.5;
    }
    if request.email.is_some() {
        score += 1.5;
    }
    if request.birthday.is_some() && request.gender.is_some() {
        score += 1.5;
    }
    if request.first_name.is_some() && request.last_name.is_some() {
        score += 0.5;
    }
    score
}

/// Cache key of a score: `uid:` followed by the SHA-256 of the name, phone
/// and birthday.
#[must_use]
pub fn score_cache_key(request: &OnlineScoreRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.first_name.as_deref().unwrap_or_default());
    hasher.update(request.last_name.as_deref().unwrap_or_default());
    hasher.update(request.phone.as_deref().unwrap_or_default());
    if let Some(birthday) = request.birthday {
        hasher.update(birthday.format("%Y%m%d").to_string());
    }
    format!("uid:{}", hex::encode(hasher.finalize()))
}

/// Store key holding a client's interests.
#[must_use]
pub fn interests_key(client_id: ClientId) -> String {
    format!("i:{client_id}")
}

fn parse_cached_score(raw: &[u8]) -> Option<f64> {
    std::str::from_utf8(raw).ok()?.trim().parse().ok()
}
