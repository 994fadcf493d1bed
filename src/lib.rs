//! Spinitron Proxy - A caching reverse proxy for the Spinitron API
//!
//! Serves collection and resource responses from an in-memory cache with
//! per-collection lifetimes. When a collection expires, every cached entry
//! belonging to it is evicted too.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod proxy;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{Cache, InvalidationCascade};
pub use config::Config;
pub use error::{CacheError, ConfigError, ProxyError, StartupError};
pub use proxy::{CachingTransport, Transport, UpstreamTransport};
pub use tasks::{spawn_cleanup_task, spawn_limiter_prune_task};
