//! Caching Policy Module
//!
//! Pure functions deciding what a request path is, which key it caches
//! under, and how long that entry lives.

mod classify;
mod key;
mod ttl;

#[cfg(test)]
mod property_tests;

pub use classify::{
    classify, collection_name, is_collection_path, is_resource_path, Classification, PathKind,
};
pub use key::{build_key, is_bypass, BYPASS_PARAM};
pub use ttl::{TtlPolicy, RESOURCE_TTL};
