//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: purges expired cache entries and triggers cascades
//! - Limiter prune: drops idle rate-limit buckets

mod cleanup;

pub use cleanup::{spawn_cleanup_task, spawn_limiter_prune_task};
