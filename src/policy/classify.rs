//! Path Classification
//!
//! Decides whether a request path names a single resource, a collection,
//! or something the cache should leave alone.

use once_cell::sync::Lazy;
use regex::Regex;

// == Grammar ==
// `/api/<word>/<digits>` with an optional query suffix.
static API_RESOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/api/[A-Za-z0-9_]+/[0-9]+(\?.*)?$").expect("valid regex"));

// `/images/` followed by any number of non-empty directories and a final
// segment that carries at least one digit.
static IMAGE_RESOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/images/([^/?#]+/)*[^/?#]*[0-9][^/?#]*(\?.*)?$").expect("valid regex")
});

// `/api/<word>` with an optional query suffix.
static API_COLLECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/api/[A-Za-z0-9_]+(\?.*)?$").expect("valid regex"));

// == Path Kind ==
/// Classification of a request path (or of a cache key built from one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// A single item, e.g. `/api/shows/2`
    Resource,
    /// A list of items, e.g. `/api/shows`
    Collection,
    /// Anything else; never cached
    Other,
}

/// Classification result paired with the extracted collection name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: PathKind,
    /// First meaningful path segment, empty when none exists
    pub collection: String,
}

impl Classification {
    /// Classifies `path` and extracts its collection name in one pass.
    pub fn of(path: &str) -> Self {
        Self {
            kind: classify(path),
            collection: collection_name(path).to_string(),
        }
    }
}

// == Classify ==
/// Classifies a path as [`PathKind::Resource`], [`PathKind::Collection`]
/// or [`PathKind::Other`].
///
/// The resource check runs first so `/api/shows/2` is never read as a
/// collection.
pub fn classify(path: &str) -> PathKind {
    if is_resource_path(path) {
        PathKind::Resource
    } else if is_collection_path(path) {
        PathKind::Collection
    } else {
        PathKind::Other
    }
}

/// Returns true if the path points at a single resource.
pub fn is_resource_path(path: &str) -> bool {
    API_RESOURCE.is_match(path) || IMAGE_RESOURCE.is_match(path)
}

/// Returns true if the path is a collection path and not a resource path.
pub fn is_collection_path(path: &str) -> bool {
    !is_resource_path(path) && API_COLLECTION.is_match(path)
}

// == Collection Name ==
/// Extracts the collection name: the first non-empty path segment that is
/// not the literal `api`. Query and fragment suffixes are ignored.
///
/// Works on any path, not only collection paths, so resource keys can be
/// matched against an expired collection key.
pub fn collection_name(path: &str) -> &str {
    let path = path
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or_default();

    path.split('/')
        .find(|segment| !segment.is_empty() && *segment != "api")
        .unwrap_or("")
}
