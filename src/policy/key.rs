//! Cache Key Construction
//!
//! Derives the canonical cache key for a request from its path and raw query.

use url::form_urlencoded;

use super::classify::{classify, PathKind};

/// Query parameter that forces a cache miss without changing the key.
pub const BYPASS_PARAM: &str = "forceRefresh";

// == Build Key ==
/// Builds the cache key for `path` and `raw_query`.
///
/// Collection paths keep their query parameters, minus [`BYPASS_PARAM`],
/// sorted by name so parameter order never forks the key. Resource and
/// other paths use the bare path; their query strings are dropped.
pub fn build_key(path: &str, raw_query: Option<&str>) -> String {
    if classify(path) != PathKind::Collection {
        return path.to_string();
    }

    let encoded = canonical_query(raw_query.unwrap_or_default());
    if encoded.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{encoded}")
    }
}

/// Returns true when the query asks to skip the cache (`forceRefresh=1`).
pub fn is_bypass(raw_query: Option<&str>) -> bool {
    raw_query.is_some_and(|query| {
        form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == BYPASS_PARAM)
            .is_some_and(|(_, value)| value == "1")
    })
}

// Sorted by name; values of a repeated name keep their request order.
fn canonical_query(raw_query: &str) -> String {
    let mut params: Vec<(String, String)> = form_urlencoded::parse(raw_query.as_bytes())
        .filter(|(name, _)| name != BYPASS_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}
