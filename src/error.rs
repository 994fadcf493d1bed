//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised by the cache store.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    /// The store cannot be built with zero capacity
    #[error("Cache capacity must be greater than zero")]
    InvalidCapacity,

    /// Key longer than the store accepts
    #[error("Key exceeds maximum length of {max} bytes (got {len})")]
    KeyTooLong { len: usize, max: usize },

    /// Payload larger than the store accepts
    #[error("Payload exceeds maximum size of {max} bytes (got {len})")]
    ValueTooLarge { len: usize, max: usize },
}

// == Proxy Error Enum ==
/// Errors surfaced while serving a proxied request.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The origin could not be reached or the exchange failed mid-flight
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// A transport failure not originating from the HTTP client
    #[error("Transport error: {0}")]
    Transport(String),

    /// The origin answered but its body could not be read
    #[error("Failed to read upstream body: {0}")]
    BodyRead(#[source] axum::Error),

    /// A request or response could not be assembled
    #[error("Invalid request: {0}")]
    Request(#[from] axum::http::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::Upstream(err) if err.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) | ProxyError::Transport(_) | ProxyError::BodyRead(_) => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::Request(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Config Error Enum ==
/// Errors raised while loading configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is empty")]
    Missing(&'static str),

    #[error("{name} is invalid: {message}")]
    Invalid { name: &'static str, message: String },
}

// == Startup Error Enum ==
/// Fatal errors while assembling the application.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The proxy refuses to run without its cache
    #[error("Failed to initialise cache: {0}")]
    Cache(#[from] CacheError),
}

// == Result Type Alias ==
/// Convenience Result type defaulting to cache errors.
pub type Result<T, E = CacheError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_maps_to_bad_gateway() {
        let response = ProxyError::Transport("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_body_read_error_maps_to_bad_gateway() {
        let err = ProxyError::BodyRead(axum::Error::new("stream reset"));
        assert!(err.to_string().contains("stream reset"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_cache_error_messages() {
        let err = CacheError::KeyTooLong { len: 3000, max: 2048 };
        assert_eq!(
            err.to_string(),
            "Key exceeds maximum length of 2048 bytes (got 3000)"
        );
    }
}
