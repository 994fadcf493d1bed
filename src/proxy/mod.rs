//! Proxy Module
//!
//! The request path between clients and the Spinitron API.
//!
//! # Components
//! - [`Transport`]: one request/response exchange
//! - [`CachingTransport`]: cache lookup, origin fallback and store
//! - [`UpstreamTransport`]: authenticated origin client
//! - [`SpinEvents`]: live-collection update broadcast

mod notify;
mod transport;
mod upstream;

pub use notify::{SpinEvents, UpdateObserver, SPIN_UPDATE_MESSAGE};
pub use transport::{CachingTransport, Transport, LIVE_COLLECTION_PREFIX};
pub use upstream::UpstreamTransport;
