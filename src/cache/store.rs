//! Cache Store Module
//!
//! Bounded key/payload storage combining recency eviction with per-entry TTL.
//! Not synchronised; see [`crate::cache::Cache`] for the shared handle.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::{CacheError, Result};

// == Lookup ==
/// Outcome of a store read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Live entry found
    Hit(Bytes),
    /// Nothing stored under the key
    Miss,
    /// The entry had outlived its TTL and was removed by this read
    Expired,
}

// == Cache Store ==
/// Capacity-bounded storage with recency eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore {
    /// Entries in recency order
    entries: LruCache<String, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store holding at most `capacity` entries.
    ///
    /// A zero capacity is rejected; the proxy must not run without a cache.
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or(CacheError::InvalidCapacity)?;
        Ok(Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::new(),
        })
    }

    // == Set ==
    /// Inserts or replaces the payload under `key` with a fresh TTL.
    ///
    /// When a new key arrives at capacity the least recently used entry is
    /// dropped. That is an eviction, not an expiry, unless the dropped entry
    /// had already outlived its TTL.
    ///
    /// Returns the key of a stale entry this write displaced, either by
    /// replacing it or by evicting it, so the caller can report the expiry.
    pub fn set(&mut self, key: String, payload: Bytes, ttl: Duration) -> Result<Option<String>> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::KeyTooLong {
                len: key.len(),
                max: MAX_KEY_LENGTH,
            });
        }

        if payload.len() > MAX_VALUE_SIZE {
            return Err(CacheError::ValueTooLarge {
                len: payload.len(),
                max: MAX_VALUE_SIZE,
            });
        }

        let entry = CacheEntry::new(payload, ttl);
        let mut expired = None;
        if let Some((displaced, previous)) = self.entries.push(key.clone(), entry) {
            if previous.is_expired() {
                debug!(expired = %displaced, "cache.expired on write");
                self.stats.record_expirations(1);
                expired = Some(displaced);
            } else if displaced != key {
                debug!(evicted = %displaced, "cache.evict");
                self.stats.record_eviction();
            }
        }

        self.stats.set_total_entries(self.entries.len());
        Ok(expired)
    }

    // == Get ==
    /// Reads the payload under `key`, refreshing its recency but not its TTL.
    ///
    /// A stale entry is removed on the spot and reported as [`Lookup::Expired`].
    pub fn get(&mut self, key: &str) -> Lookup {
        let expired = match self.entries.peek(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return Lookup::Miss;
            }
        };

        if expired {
            self.entries.pop(key);
            self.stats.record_miss();
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
            return Lookup::Expired;
        }

        match self.entries.get(key) {
            Some(entry) => {
                self.stats.record_hit();
                Lookup::Hit(entry.payload.clone())
            }
            None => Lookup::Miss,
        }
    }

    // == Delete ==
    /// Removes one entry. Returns true if it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.invalidate(std::iter::once(key)) == 1
    }

    // == Invalidate ==
    /// Removes every listed key that is present. Returns how many were removed.
    pub fn invalidate<'a, I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let removed = keys
            .into_iter()
            .filter(|key| self.entries.pop(*key).is_some())
            .count();

        self.stats.record_invalidations(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Remove Expired ==
    /// Removes every entry whose TTL has elapsed and returns their keys.
    pub fn remove_expired(&mut self) -> Vec<String> {
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.pop(key.as_str());
        }

        self.stats.record_expirations(expired.len());
        self.stats.set_total_entries(self.entries.len());
        expired
    }

    /// Remaining lifetime of `key` without touching its recency.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.entries.peek(key).map(CacheEntry::ttl_remaining)
    }

    // == Keys ==
    /// Snapshot of every stored key, live or stale.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const LONG: Duration = Duration::from_secs(300);

    fn payload(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[test]
    fn test_store_new() {
        let store = CacheStore::new(100).unwrap();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 100);
    }

    #[test]
    fn test_store_zero_capacity_fails() {
        assert_eq!(CacheStore::new(0).unwrap_err(), CacheError::InvalidCapacity);
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = CacheStore::new(100).unwrap();

        store.set("/api/shows".to_string(), payload("[1]"), LONG).unwrap();

        assert_eq!(store.get("/api/shows"), Lookup::Hit(payload("[1]")));
        assert_eq!(store.len(), 1);
        assert!(store.ttl_remaining("/api/shows").unwrap() > Duration::from_secs(299));
        assert_eq!(store.ttl_remaining("/api/spins"), None);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = CacheStore::new(100).unwrap();
        assert_eq!(store.get("/api/shows"), Lookup::Miss);
    }

    #[test]
    fn test_store_overwrite_replaces_payload() {
        let mut store = CacheStore::new(100).unwrap();

        store.set("k".to_string(), payload("v1"), LONG).unwrap();
        store.set("k".to_string(), payload("v2"), LONG).unwrap();

        assert_eq!(store.get("k"), Lookup::Hit(payload("v2")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_store_overwrite_resets_ttl() {
        let mut store = CacheStore::new(100).unwrap();

        let ttl = Duration::from_millis(100);
        store.set("k".to_string(), payload("v1"), ttl).unwrap();
        sleep(Duration::from_millis(60));
        store.set("k".to_string(), payload("v2"), ttl).unwrap();
        sleep(Duration::from_millis(60));

        assert_eq!(store.get("k"), Lookup::Hit(payload("v2")));
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store = CacheStore::new(100).unwrap();

        store.set("k".to_string(), payload("v"), Duration::from_millis(30)).unwrap();
        assert!(matches!(store.get("k"), Lookup::Hit(_)));

        sleep(Duration::from_millis(50));

        assert_eq!(store.get("k"), Lookup::Expired);
        assert_eq!(store.get("k"), Lookup::Miss);
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_store_lru_eviction() {
        let mut store = CacheStore::new(3).unwrap();

        store.set("key1".to_string(), payload("1"), LONG).unwrap();
        store.set("key2".to_string(), payload("2"), LONG).unwrap();
        store.set("key3".to_string(), payload("3"), LONG).unwrap();
        store.set("key4".to_string(), payload("4"), LONG).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("key1"), Lookup::Miss);
        assert_eq!(store.stats().evictions, 1);
        assert_eq!(store.stats().expirations, 0);
    }

    #[test]
    fn test_store_overwrite_reports_stale_entry() {
        let mut store = CacheStore::new(100).unwrap();

        store.set("k".to_string(), payload("v1"), Duration::from_millis(20)).unwrap();
        sleep(Duration::from_millis(40));

        let displaced = store.set("k".to_string(), payload("v2"), LONG).unwrap();
        assert_eq!(displaced, Some("k".to_string()));
        assert_eq!(store.get("k"), Lookup::Hit(payload("v2")));
        assert_eq!(store.stats().expirations, 1);

        // A live entry being replaced is not reported.
        assert_eq!(store.set("k".to_string(), payload("v3"), LONG).unwrap(), None);
    }

    #[test]
    fn test_store_eviction_of_stale_entry_is_an_expiry() {
        let mut store = CacheStore::new(2).unwrap();

        store.set("stale".to_string(), payload("1"), Duration::from_millis(20)).unwrap();
        store.set("live".to_string(), payload("2"), LONG).unwrap();
        sleep(Duration::from_millis(40));

        let displaced = store.set("new".to_string(), payload("3"), LONG).unwrap();
        assert_eq!(displaced, Some("stale".to_string()));

        let stats = store.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let mut store = CacheStore::new(3).unwrap();

        store.set("key1".to_string(), payload("1"), LONG).unwrap();
        store.set("key2".to_string(), payload("2"), LONG).unwrap();
        store.set("key3".to_string(), payload("3"), LONG).unwrap();

        store.get("key1");
        store.set("key4".to_string(), payload("4"), LONG).unwrap();

        assert!(matches!(store.get("key1"), Lookup::Hit(_)));
        assert_eq!(store.get("key2"), Lookup::Miss);
    }

    #[test]
    fn test_store_delete_and_invalidate() {
        let mut store = CacheStore::new(100).unwrap();

        store.set("a".to_string(), payload("1"), LONG).unwrap();
        store.set("b".to_string(), payload("2"), LONG).unwrap();
        store.set("c".to_string(), payload("3"), LONG).unwrap();

        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert_eq!(store.invalidate(["b", "c", "missing"]), 2);
        assert!(store.is_empty());
        assert_eq!(store.stats().invalidations, 3);
    }

    #[test]
    fn test_store_remove_expired() {
        let mut store = CacheStore::new(100).unwrap();

        store.set("short".to_string(), payload("1"), Duration::from_millis(20)).unwrap();
        store.set("long".to_string(), payload("2"), LONG).unwrap();

        sleep(Duration::from_millis(40));

        assert_eq!(store.remove_expired(), vec!["short".to_string()]);
        assert_eq!(store.len(), 1);
        assert!(store.remove_expired().is_empty());
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::new(100).unwrap();

        store.set("k".to_string(), payload("v"), LONG).unwrap();
        store.get("k");
        store.get("missing");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_store_key_too_long() {
        let mut store = CacheStore::new(100).unwrap();
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);

        let result = store.set(long_key, payload("v"), LONG);
        assert!(matches!(result, Err(CacheError::KeyTooLong { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_value_too_large() {
        let mut store = CacheStore::new(100).unwrap();
        let large = Bytes::from(vec![0u8; MAX_VALUE_SIZE + 1]);

        let result = store.set("k".to_string(), large, LONG);
        assert!(matches!(result, Err(CacheError::ValueTooLarge { .. })));
    }
}
