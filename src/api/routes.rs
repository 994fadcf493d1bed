//! API Routes
//!
//! Configures the Axum router with the proxy's endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{
    health_handler, proxy_handler, spin_events_handler, stats_handler, trigger_spins_handler,
    AppState,
};
use super::rate_limit::rate_limit;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/*` - Cached Spinitron API passthrough
/// - `GET /images/*` - Cached image passthrough
/// - `GET /spin-events` - Server-sent spin update notifications
/// - `POST /trigger/spins` - Force a spins refresh
/// - `GET /stats` - Cache statistics
/// - `GET /healthz` - Liveness probe
///
/// The first four are rate limited per client address and path.
pub fn create_router(state: AppState) -> Router {
    let limited = Router::new()
        .route("/api/*path", get(proxy_handler))
        .route("/images/*path", get(proxy_handler))
        .route("/spin-events", get(spin_events_handler))
        .route("/trigger/spins", post(trigger_spins_handler))
        .layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit,
        ));

    Router::new()
        .merge(limited)
        .route("/stats", get(stats_handler))
        .route("/healthz", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
