//! Rate Limiting
//!
//! Sliding-window admission control keyed by client address and path.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::models::ErrorResponse;

// == Rate Limiter ==
/// Admits at most `max_requests` per key within any `window`.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    visitors: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            visitors: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    // == Allow ==
    /// Records a request under `key` if the window still has room.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut visitors = self.visitors.lock().unwrap_or_else(|e| e.into_inner());
        let hits = visitors.entry(key.to_string()).or_default();

        while hits
            .front()
            .is_some_and(|&at| now.duration_since(at) >= self.window)
        {
            hits.pop_front();
        }

        if hits.len() >= self.max_requests {
            return false;
        }
        hits.push_back(now);
        true
    }

    // == Prune ==
    /// Forgets keys with no request inside the current window. Returns how
    /// many keys remain tracked.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut visitors = self.visitors.lock().unwrap_or_else(|e| e.into_inner());
        visitors.retain(|_, hits| {
            hits.back()
                .is_some_and(|&at| now.duration_since(at) < self.window)
        });
        visitors.len()
    }
}

// == Middleware ==
/// Rejects over-limit requests with `429 Too Many Requests`.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let key = format!("{client}{}", req.uri().path());

    if limiter.allow(&key) {
        return next.run(req).await;
    }

    warn!(client = %client, path = %req.uri().path(), "Rate limit exceeded");
    let retry_after = limiter.window().as_secs().max(1);
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorResponse::new("Too Many Requests")),
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
        response.headers_mut().insert(RETRY_AFTER, value);
    }
    response
}
