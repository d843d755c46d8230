use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cache::{CacheResult, SearchCacheStore, expiry_after};
use crate::clock::{Clock, SystemClock};
use crate::models::{SearchError, SearchErrorKind};

#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    pub value: Value,
    pub expires_at: SystemTime,
}

impl CacheEntry {
    fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }
}

/// Process-local cache. Expired entries are dropped when read, by
/// `purge_expired`, or by a sweeper task.
pub struct InMemorySearchCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemorySearchCache {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl InMemorySearchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn len(&self) -> CacheResult<usize> {
        Ok(self.lock_entries()?.len())
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.lock_entries()?.is_empty())
    }

    pub fn purge_expired(&self) -> CacheResult<usize> {
        let now = self.clock.now();
        let mut entries = self.lock_entries()?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - entries.len())
    }

    fn lock_entries(&self) -> CacheResult<MutexGuard<'_, HashMap<String, CacheEntry>>> {
        self.entries.lock().map_err(|_| {
            SearchError::new(
                SearchErrorKind::Internal,
                "search cache mutex poisoned".to_string(),
            )
        })
    }
}

impl SearchCacheStore for InMemorySearchCache {
    fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let now = self.clock.now();
        let mut entries = self.lock_entries()?;

        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value, ttl: Duration) -> CacheResult<()> {
        let expires_at = expiry_after(self.clock.now(), ttl)?;
        self.lock_entries()?.insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                expires_at,
            },
        );
        Ok(())
    }
}

/// Spawns a task on the current tokio runtime that purges expired entries
/// every `period`. Abort the handle to stop it. A zero period is rejected.
pub fn spawn_expiry_sweeper(
    cache: Arc<InMemorySearchCache>,
    period: Duration,
) -> CacheResult<JoinHandle<()>> {
    if period.is_zero() {
        return Err(SearchError::invalid_input(
            "expiry sweeper period must be non-zero",
        ));
    }

    Ok(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match cache.purge_expired() {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "purged expired search cache entries"),
                Err(error) => {
                    tracing::warn!(
                        kind = ?error.kind,
                        message = %error.message,
                        "failed to purge expired search cache entries"
                    );
                }
            }
        }
    }))
}
