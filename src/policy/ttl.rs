//! TTL Policy
//!
//! Maps a cache key to how long its entry may live.

use std::collections::HashMap;
use std::time::Duration;

use super::classify::{Classification, PathKind};

/// Lifetime shared by every resource entry.
pub const RESOURCE_TTL: Duration = Duration::from_secs(3 * 60);

// == TTL Policy ==
/// Lifetime table for cached entries.
///
/// Resources share one lifetime. Collections are looked up by name; an
/// unlisted collection (and any `Other` key) has no lifetime, which means
/// the response is not cached at all.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    resource_ttl: Duration,
    collections: HashMap<String, Duration>,
}

impl TtlPolicy {
    /// Creates an empty policy: resources use `resource_ttl`, no
    /// collection is cached until added.
    pub fn new(resource_ttl: Duration) -> Self {
        Self {
            resource_ttl,
            collections: HashMap::new(),
        }
    }

    /// Adds or replaces the lifetime of one collection.
    pub fn with_collection(mut self, name: impl Into<String>, ttl: Duration) -> Self {
        self.collections.insert(name.into(), ttl);
        self
    }

    // == TTL ==
    /// Returns the lifetime for `key`, or `None` if it must not be cached.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let Classification { kind, collection } = Classification::of(key);
        match kind {
            PathKind::Resource => Some(self.resource_ttl),
            PathKind::Collection => self.collections.get(&collection).copied(),
            PathKind::Other => None,
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(RESOURCE_TTL)
            .with_collection("personas", Duration::from_secs(5 * 60))
            .with_collection("shows", Duration::from_secs(5 * 60))
            .with_collection("playlists", Duration::from_secs(3 * 60))
            .with_collection("spins", Duration::from_secs(30))
    }
}
