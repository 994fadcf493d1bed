//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

use bytes::Bytes;

// == Cache Entry ==
/// A cached response body and its deadline.
///
/// Replacing an entry creates a new one, so the deadline always restarts
/// from the latest write.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored response body
    pub payload: Bytes,
    /// When the entry was written
    pub created_at: Instant,
    /// When the entry stops being served
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry that expires `ttl` from now.
    pub fn new(payload: Bytes, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            payload,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its deadline, so a
    /// zero TTL produces an entry that is expired on arrival.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks expiry against a caller-supplied clock reading.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, saturating at zero.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(Bytes::from_static(b"{}"), Duration::from_secs(60));

        assert_eq!(entry.payload, Bytes::from_static(b"{}"));
        assert!(entry.expires_at > entry.created_at);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(Bytes::from_static(b"[]"), Duration::from_millis(20));

        assert!(!entry.is_expired());
        sleep(Duration::from_millis(40));
        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining(), Duration::ZERO);
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new(Bytes::new(), Duration::from_secs(10));

        let remaining = entry.ttl_remaining();
        assert!(remaining <= Duration::from_secs(10));
        assert!(remaining >= Duration::from_secs(9));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let entry = CacheEntry::new(Bytes::new(), Duration::ZERO);
        assert!(entry.is_expired_at(entry.created_at));
    }
}
