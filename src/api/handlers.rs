//! API Handlers
//!
//! HTTP request handlers for the proxy's endpoints.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::api::rate_limit::RateLimiter;
use crate::cache::Cache;
use crate::config::Config;
use crate::error::{ProxyError, StartupError};
use crate::models::StatsResponse;
use crate::proxy::{CachingTransport, SpinEvents, Transport, UpstreamTransport};

/// Internal request issued by `POST /trigger/spins`.
pub const TRIGGER_SPINS_URI: &str = "/api/spins?forceRefresh=1";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Caching transport in front of the origin
    pub transport: Arc<CachingTransport>,
    /// Spin update broadcast for SSE clients
    pub events: SpinEvents,
    /// Admission control for client-facing routes
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wires the cache, the origin transport and the update broadcast.
    pub fn new(origin: Arc<dyn Transport>, cache: Cache, limiter: RateLimiter) -> Self {
        let events = SpinEvents::default();
        let transport =
            CachingTransport::new(origin, cache).with_observer(Arc::new(events.clone()));
        Self::from_parts(transport, events, limiter)
    }

    /// Assembles state from an already-configured transport.
    pub fn from_parts(transport: CachingTransport, events: SpinEvents, limiter: RateLimiter) -> Self {
        Self {
            transport: Arc::new(transport),
            events,
            limiter: Arc::new(limiter),
        }
    }

    /// Creates the production state from configuration.
    ///
    /// Fails if the cache cannot be built; the proxy never runs uncached.
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let cache = Cache::with_cascade(config.cache_capacity)?;
        let origin = UpstreamTransport::from_config(config)?;
        let limiter = RateLimiter::new(config.rate_limit_max, config.rate_limit_window);
        Ok(Self::new(Arc::new(origin), cache, limiter))
    }

    pub fn cache(&self) -> &Cache {
        self.transport.cache()
    }
}

/// Handler for GET /api/* and GET /images/*
///
/// Serves the request through the caching transport.
pub async fn proxy_handler(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, ProxyError> {
    state.transport.handle(req).await
}

/// Handler for POST /trigger/spins
///
/// Refetches the spins collection so the cache and SSE clients see new
/// data immediately.
pub async fn trigger_spins_handler(State(state): State<AppState>) -> Result<Response, ProxyError> {
    info!("trigger.spins");

    let req = axum::http::Request::builder()
        .method(Method::GET)
        .uri(TRIGGER_SPINS_URI)
        .body(Body::empty())?;

    let response = match state.transport.handle(req).await {
        Ok(resp) if resp.status() == StatusCode::OK => (
            StatusCode::OK,
            "Forced refresh of /api/spins. Cache updated.",
        )
            .into_response(),
        Ok(resp) => (
            StatusCode::BAD_GATEWAY,
            format!("Failed to fetch spins: upstream returned {}", resp.status()),
        )
            .into_response(),
        Err(err) => {
            warn!(error = %err, "trigger.spins failed");
            (StatusCode::BAD_GATEWAY, format!("Failed to fetch spins: {err}")).into_response()
        }
    };
    Ok(response)
}

/// Handler for GET /spin-events
///
/// Streams `data: new spin data` whenever the spins collection is refetched.
pub async fn spin_events_handler(State(state): State<AppState>) -> Response {
    let subscription = Subscription::new(state.events.clone());

    let stream = async_stream::stream! {
        let mut subscription = subscription;
        loop {
            match subscription.rx.recv().await {
                Ok(message) => yield Ok::<Event, Infallible>(Event::default().data(message)),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "sse.lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

// Logs connects and disconnects of one SSE client.
struct Subscription {
    events: SpinEvents,
    rx: broadcast::Receiver<String>,
}

impl Subscription {
    fn new(events: SpinEvents) -> Self {
        let rx = events.subscribe();
        info!(subscribers = events.subscriber_count(), "sse.connect");
        Self { events, rx }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let remaining = self.events.subscriber_count().saturating_sub(1);
        info!(subscribers = remaining, "sse.disconnect");
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache();
    let stats = cache.stats().await;

    Json(StatsResponse::new(
        &stats,
        cache.capacity().await,
        state.events.subscriber_count(),
    ))
}

/// Handler for GET /healthz
pub async fn health_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct JsonOrigin;

    #[async_trait]
    impl Transport for JsonOrigin {
        async fn round_trip(&self, req: Request) -> Result<Response, ProxyError> {
            Ok(Response::new(Body::from(format!(
                "{{\"path\":\"{}\"}}",
                req.uri().path()
            ))))
        }
    }

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(JsonOrigin),
            Cache::with_cascade(100).unwrap(),
            RateLimiter::new(100, Duration::from_secs(60)),
        )
    }

    #[tokio::test]
    async fn test_trigger_refreshes_spins_and_broadcasts() {
        let state = test_state();
        let mut rx = state.events.subscribe();

        let response = trigger_spins_handler(State(state.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert!(state.cache().get("/api/spins").await.is_some());
        assert_eq!(rx.recv().await.unwrap(), "new spin data");
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.capacity, 100);
    }

    #[tokio::test]
    async fn test_health_handler() {
        assert_eq!(health_handler().await, "OK");
    }

    #[test]
    fn test_from_config_rejects_zero_capacity() {
        let config = Config::from_lookup(|name| match name {
            "SPINITRON_API_KEY" => Some("token".to_string()),
            "INSTALLATION_BASE_URL" => Some("radio.example.org".to_string()),
            "CACHE_CAPACITY" => Some("0".to_string()),
            _ => None,
        })
        .unwrap();

        assert!(matches!(
            AppState::from_config(&config),
            Err(StartupError::Cache(_))
        ));
    }
}
