//! Caching Transport
//!
//! Interception point for every outbound call: serves cached bodies, or
//! forwards to the origin and stores what comes back.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, HeaderValue, Request, Response, StatusCode};
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::cache::Cache;
use crate::error::ProxyError;
use crate::policy::{build_key, is_bypass, TtlPolicy};
use crate::proxy::notify::{UpdateObserver, SPIN_UPDATE_MESSAGE};

/// Path prefix of the collection whose refreshes are broadcast.
pub const LIVE_COLLECTION_PREFIX: &str = "/api/spins";

// == Transport ==
/// One request/response exchange with whatever sits behind it.
///
/// Errors are transport-level failures; a non-success status is still `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(&self, req: Request<Body>) -> Result<Response<Body>, ProxyError>;
}

// == Caching Transport ==
/// Wraps an origin [`Transport`] with the response cache.
///
/// There is no global critical section: concurrent misses on one key all
/// reach the origin and the last store wins.
pub struct CachingTransport {
    inner: Arc<dyn Transport>,
    cache: Cache,
    ttl: TtlPolicy,
    observer: Option<Arc<dyn UpdateObserver>>,
    live_prefix: String,
}

impl CachingTransport {
    /// Creates a caching transport with the default lifetime table and no
    /// update observer.
    pub fn new(inner: Arc<dyn Transport>, cache: Cache) -> Self {
        Self {
            inner,
            cache,
            ttl: TtlPolicy::default(),
            observer: None,
            live_prefix: LIVE_COLLECTION_PREFIX.to_string(),
        }
    }

    pub fn with_ttl_policy(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    /// Registers the observer told about live-collection refreshes.
    pub fn with_observer(mut self, observer: Arc<dyn UpdateObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_live_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.live_prefix = prefix.into();
        self
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    // == Handle ==
    /// Serves `req` from the cache or the origin.
    ///
    /// - `forceRefresh=1` skips the lookup but still stores the fresh body.
    /// - A hit is answered with `200` and `Content-Type: application/json`.
    /// - Origin failures and non-`200` responses pass through uncached.
    /// - A failed store write is logged; the response is still returned.
    pub async fn handle(&self, req: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(str::to_owned);
        let key = build_key(&path, query.as_deref());

        if is_bypass(query.as_deref()) {
            info!(key = %key, "cache.skip (forceRefresh)");
        } else if let Some(payload) = self.cache.get(&key).await {
            return Ok(cached_response(payload));
        }

        let tick = Instant::now();
        let response = self.inner.round_trip(req).await?;
        if response.status() != StatusCode::OK {
            debug!(key = %key, status = %response.status(), "request.made: not cached");
            return Ok(response);
        }

        let (parts, body) = response.into_parts();
        let data = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(ProxyError::BodyRead)?;
        info!(key = %key, elapsed = ?tick.elapsed(), "request.made");

        match self.ttl.ttl(&key) {
            Some(ttl) => {
                if let Err(err) = self.cache.set(&key, data.clone(), ttl).await {
                    warn!(key = %key, error = %err, "cache.set failed");
                }
            }
            None => debug!(key = %key, "cache.set skipped: no lifetime for key"),
        }

        if path.starts_with(&self.live_prefix) {
            if let Some(observer) = &self.observer {
                observer.notify(SPIN_UPDATE_MESSAGE);
            }
        }

        Ok(Response::from_parts(parts, Body::from(data)))
    }
}

#[async_trait]
impl Transport for CachingTransport {
    async fn round_trip(&self, req: Request<Body>) -> Result<Response<Body>, ProxyError> {
        self.handle(req).await
    }
}

fn cached_response(payload: Bytes) -> Response<Body> {
    let mut response = Response::new(Body::from(payload));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
