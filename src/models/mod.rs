//! Response models for the proxy's own endpoints
//!
//! Proxied bodies pass through untouched; these DTOs only cover the JSON
//! the proxy writes itself.

pub mod responses;

pub use responses::{ErrorResponse, StatsResponse};
