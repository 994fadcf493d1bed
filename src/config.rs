//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::cache::DEFAULT_CAPACITY;
use crate::error::ConfigError;

/// Default origin for proxied requests.
pub const DEFAULT_UPSTREAM_URL: &str = "https://spinitron.com";

/// Proxy configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token for the Spinitron API
    pub api_token: String,
    /// Public host presented to the origin as `Host`/`X-Forwarded-Host`
    pub public_host: String,
    /// Origin base URL
    pub upstream_url: Url,
    /// Timeout for a single origin request
    pub upstream_timeout: Duration,
    /// HTTP server port
    pub server_port: u16,
    /// Maximum number of cached responses
    pub cache_capacity: usize,
    /// Interval between expiry sweeps
    pub cleanup_interval: Duration,
    /// Requests admitted per client and path within one window
    pub rate_limit_max: usize,
    /// Sliding rate-limit window
    pub rate_limit_window: Duration,
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `SPINITRON_API_KEY` - API token (required)
    /// - `INSTALLATION_BASE_URL` - public host (required)
    /// - `UPSTREAM_URL` - origin base URL (default: https://spinitron.com)
    /// - `UPSTREAM_TIMEOUT_SECS` - origin timeout (default: 30)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `CACHE_CAPACITY` - maximum cache entries (default: 2000)
    /// - `CLEANUP_INTERVAL_MS` - expiry sweep frequency (default: 1000)
    /// - `RATE_LIMIT_MAX` - requests per window (default: 60)
    /// - `RATE_LIMIT_WINDOW_SECS` - window length (default: 60)
    ///
    /// Zero is rejected for the timeout, the sweep interval and the window.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let upstream = lookup("UPSTREAM_URL").unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string());
        let upstream_url = Url::parse(&upstream).map_err(|e| ConfigError::Invalid {
            name: "UPSTREAM_URL",
            message: e.to_string(),
        })?;

        Ok(Self {
            api_token: required("SPINITRON_API_KEY")?,
            public_host: required("INSTALLATION_BASE_URL")?,
            upstream_url,
            upstream_timeout: Duration::from_secs(positive_or(&lookup, "UPSTREAM_TIMEOUT_SECS", 30)?),
            server_port: parse_or(&lookup, "SERVER_PORT", 8080),
            cache_capacity: parse_or(&lookup, "CACHE_CAPACITY", DEFAULT_CAPACITY),
            cleanup_interval: Duration::from_millis(positive_or(&lookup, "CLEANUP_INTERVAL_MS", 1000)?),
            rate_limit_max: parse_or(&lookup, "RATE_LIMIT_MAX", 60),
            rate_limit_window: Duration::from_secs(positive_or(&lookup, "RATE_LIMIT_WINDOW_SECS", 60)?),
        })
    }
}

// Durations of zero would stall timers or disable limits outright.
fn positive_or<F>(lookup: &F, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, name, default) {
        0 => Err(ConfigError::Invalid {
            name,
            message: "must be greater than zero".to_string(),
        }),
        value => Ok(value),
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
