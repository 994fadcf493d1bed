//! Cache Module
//!
//! In-memory response cache with TTL expiration, recency eviction and
//! cascading collection invalidation.

mod cascade;
mod entry;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use cascade::{evict_collection, InvalidationCascade};
pub use entry::CacheEntry;
pub use shared::{Cache, ExpiryListener};
pub use stats::CacheStats;
pub use store::{CacheStore, Lookup};

// == Public Constants ==
/// Default number of entries the proxy cache holds
pub const DEFAULT_CAPACITY: usize = 2000;

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 2048;

/// Maximum allowed payload size in bytes
pub const MAX_VALUE_SIZE: usize = 16 * 1024 * 1024; // 16 MB
