//! Invalidation Cascade
//!
//! When a collection snapshot expires, every cached entry derived from that
//! collection goes with it, so a fresh collection is never served next to
//! stale items (or the reverse).

use std::time::Instant;

use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::cache::{Cache, ExpiryListener};
use crate::policy::{collection_name, Classification, PathKind};

/// Expiry listener that sweeps a collection's entries once its snapshot
/// expires. Resource and other keys never cascade.
#[derive(Debug, Default, Clone, Copy)]
pub struct InvalidationCascade;

impl ExpiryListener for InvalidationCascade {
    fn on_expired(&self, cache: &Cache, key: &str) {
        let Classification { kind, collection } = Classification::of(key);
        if kind != PathKind::Collection {
            return;
        }

        let expired_key = key.to_string();
        let cache = cache.clone();

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    sweep(&cache, &collection, Some(&expired_key)).await;
                });
            }
            Err(_) => warn!(collection = %collection, "cache.evicting skipped: no runtime"),
        }
    }
}

// == Evict Collection ==
/// Removes every stored key whose collection name is `name`.
///
/// Membership is recomputed from each key at sweep time. A `set` racing the
/// sweep may lose its entry; the store itself stays consistent.
pub async fn evict_collection(cache: &Cache, name: &str) -> usize {
    sweep(cache, name, None).await
}

// The key whose expiry started the sweep is left alone: by now it is either
// gone or already holds a fresh snapshot.
async fn sweep(cache: &Cache, name: &str, spare: Option<&str>) -> usize {
    let tick = Instant::now();

    let doomed: Vec<String> = cache
        .keys()
        .await
        .into_iter()
        .filter(|key| Some(key.as_str()) != spare && collection_name(key) == name)
        .collect();
    let removed = cache.invalidate(&doomed).await;

    info!(collection = name, removed, elapsed = ?tick.elapsed(), "cache.evicting");
    removed
}
