//! API Module
//!
//! HTTP handlers, rate limiting and routing for the proxy.
//!
//! # Endpoints
//! - `GET /api/*`, `GET /images/*` - Cached passthrough to the origin
//! - `GET /spin-events` - SSE stream of spin updates
//! - `POST /trigger/spins` - Force a spins refresh
//! - `GET /stats` - Cache statistics
//! - `GET /healthz` - Health check endpoint

pub mod handlers;
pub mod rate_limit;
pub mod routes;

pub use handlers::*;
pub use rate_limit::{rate_limit, RateLimiter};
pub use routes::create_router;
