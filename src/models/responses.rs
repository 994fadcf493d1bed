//! Response DTOs for the proxy's own endpoints
//!
//! Defines the structure of outgoing JSON bodies not produced by the origin.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub invalidations: u64,
    pub total_entries: usize,
    pub capacity: usize,
    /// Cache hit rate (0.0 to 1.0)
    pub hit_rate: f64,
    /// Number of connected SSE clients
    pub subscribers: usize,
    /// When the snapshot was taken (RFC 3339)
    pub timestamp: String,
}

impl StatsResponse {
    /// Creates a StatsResponse from a cache statistics snapshot
    pub fn new(stats: &CacheStats, capacity: usize, subscribers: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            invalidations: stats.invalidations,
            total_entries: stats.total_entries,
            capacity,
            hit_rate: stats.hit_rate(),
            subscribers,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
