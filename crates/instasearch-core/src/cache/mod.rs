pub mod in_memory;

pub use in_memory::{CacheEntry, InMemorySearchCache, spawn_expiry_sweeper};

use std::time::{Duration, SystemTime};

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::models::SearchError;

pub type CacheResult<T> = Result<T, SearchError>;

pub const CACHE_KEY_PREFIX: &str = "instant_search_cache_";

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Key/value store with per-entry expiry, shared by every request.
///
/// Writes to the same key are last-writer-wins.
pub trait SearchCacheStore: Send + Sync {
    fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    fn set(&self, key: &str, value: &Value, ttl: Duration) -> CacheResult<()>;
}

/// Absolute expiry of an entry written at `now`. A TTL the clock cannot
/// represent is rejected instead of wrapping.
pub fn expiry_after(now: SystemTime, ttl: Duration) -> CacheResult<SystemTime> {
    now.checked_add(ttl).ok_or_else(|| {
        SearchError::invalid_input(format!(
            "cache ttl of {}s is beyond the representable clock range",
            ttl.as_secs()
        ))
    })
}

/// Cache key for a request: prefix plus the SHA-256 of its canonical JSON.
pub fn fingerprint(args: &Value) -> String {
    let digest = Sha256::digest(canonical_json(args).as_bytes());
    format!("{CACHE_KEY_PREFIX}{}", hex::encode(digest))
}

/// Serializes with object keys sorted at every level, so structurally equal
/// values produce identical text regardless of insertion order.
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, value)| (key.clone(), canonicalize(value)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
