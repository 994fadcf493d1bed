//! Shared Cache Handle
//!
//! Thread-safe wrapper around [`CacheStore`] that reports TTL expiries to a
//! registered listener.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::store::Lookup;
use crate::cache::{CacheStats, CacheStore, InvalidationCascade};
use crate::error::Result;

// == Expiry Listener ==
/// Observer told about entries removed because their TTL elapsed.
///
/// Called once per expired entry, after the store lock is released. That
/// includes a stale entry pushed out by a later write. Evictions of live
/// entries and explicit deletes are never reported. Implementors
/// must not block; spawn any follow-up work.
pub trait ExpiryListener: Send + Sync {
    fn on_expired(&self, cache: &Cache, key: &str);
}

// == Cache ==
/// Cloneable, thread-safe cache handle.
#[derive(Clone)]
pub struct Cache {
    store: Arc<RwLock<CacheStore>>,
    listener: Option<Arc<dyn ExpiryListener>>,
}

impl Cache {
    // == Constructors ==
    /// Builds a cache of `capacity` entries with an optional expiry listener.
    pub fn new(capacity: usize, listener: Option<Arc<dyn ExpiryListener>>) -> Result<Self> {
        Ok(Self {
            store: Arc::new(RwLock::new(CacheStore::new(capacity)?)),
            listener,
        })
    }

    /// Builds a cache whose collection expiries cascade to their resources.
    pub fn with_cascade(capacity: usize) -> Result<Self> {
        Self::new(capacity, Some(Arc::new(InvalidationCascade)))
    }

    // == Get ==
    /// Returns the live payload under `key`, if any. Never extends the TTL.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let tick = Instant::now();
        let lookup = self.store.write().await.get(key);
        debug!(key, elapsed = ?tick.elapsed(), "cache.get");

        match lookup {
            Lookup::Hit(payload) => Some(payload),
            Lookup::Miss => None,
            Lookup::Expired => {
                self.notify_expired(std::slice::from_ref(&key.to_string()));
                None
            }
        }
    }

    // == Set ==
    /// Inserts or replaces `key`, restarting its TTL.
    ///
    /// A stale entry pushed out by this write, whether replaced or evicted,
    /// is reported to the listener like any other expiry.
    pub async fn set(&self, key: &str, payload: Bytes, ttl: Duration) -> Result<()> {
        let tick = Instant::now();
        let expired = self.store.write().await.set(key.to_string(), payload, ttl)?;
        debug!(key, ttl = ?ttl, elapsed = ?tick.elapsed(), "cache.set");

        if let Some(expired) = expired {
            self.notify_expired(std::slice::from_ref(&expired));
        }
        Ok(())
    }

    /// Removes one entry without notifying the listener.
    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    /// Removes every listed key without notifying the listener.
    pub async fn invalidate(&self, keys: &[String]) -> usize {
        if keys.is_empty() {
            return 0;
        }
        self.store
            .write()
            .await
            .invalidate(keys.iter().map(String::as_str))
    }

    // == Purge Expired ==
    /// Drops every stale entry and reports each one to the listener.
    pub async fn purge_expired(&self) -> usize {
        let expired = self.store.write().await.remove_expired();
        self.notify_expired(&expired);
        expired.len()
    }

    pub async fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.store.read().await.ttl_remaining(key)
    }

    pub async fn keys(&self) -> Vec<String> {
        self.store.read().await.keys()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub async fn capacity(&self) -> usize {
        self.store.read().await.capacity()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    fn notify_expired(&self, keys: &[String]) {
        if let Some(listener) = &self.listener {
            for key in keys {
                listener.on_expired(self, key);
            }
        }
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("has_listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}
