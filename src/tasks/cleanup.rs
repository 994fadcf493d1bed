//! Cleanup Tasks
//!
//! Background tasks that sweep expired cache entries and idle rate-limit
//! buckets.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::RateLimiter;
use crate::cache::Cache;

// `tokio::time::interval` panics on a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Spawns a background task that periodically purges expired cache entries.
///
/// Every purged key is reported to the cache's expiry listener, so expired
/// collections cascade even if nobody requests them again.
///
/// The returned handle is aborted during graceful shutdown.
pub fn spawn_cleanup_task(cache: Cache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval = ?interval, "Starting expiry sweep task");

        let mut ticker = tokio::time::interval(interval.max(MIN_PERIOD));
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = cache.purge_expired().await;
            if removed > 0 {
                info!(removed, "cache.expired");
            } else {
                debug!("Expiry sweep: nothing to remove");
            }
        }
    })
}

/// Spawns a background task that forgets rate-limit keys idle for a whole
/// window.
pub fn spawn_limiter_prune_task(limiter: Arc<RateLimiter>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(MIN_PERIOD));
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let tracked = limiter.prune();
            debug!(tracked, "Rate limiter pruned");
        }
    })
}
