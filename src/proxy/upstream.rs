//! Upstream Transport
//!
//! Forwards requests to the Spinitron API with the station's credentials.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Request, Response,
};
use url::Url;

use crate::config::Config;
use crate::error::{ConfigError, ProxyError};
use crate::proxy::Transport;

// Per-connection headers that must not be relayed.
static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    HeaderName::from_static("keep-alive"),
];

const X_FORWARDED_HOST: &str = "x-forwarded-host";

// == Upstream Transport ==
/// [`Transport`] that sends requests to the origin over HTTP.
///
/// Injects `Authorization: Bearer <token>`, asks for JSON and presents the
/// public installation host. Bodies are streamed back unread.
#[derive(Debug, Clone)]
pub struct UpstreamTransport {
    client: reqwest::Client,
    base_url: Url,
    token: HeaderValue,
    public_host: HeaderValue,
}

impl UpstreamTransport {
    pub fn new(
        base_url: Url,
        token: &str,
        public_host: &str,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let mut token = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            ConfigError::Invalid {
                name: "SPINITRON_API_KEY",
                message: e.to_string(),
            }
        })?;
        token.set_sensitive(true);
        let public_host = HeaderValue::from_str(public_host).map_err(|e| ConfigError::Invalid {
            name: "INSTALLATION_BASE_URL",
            message: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Invalid {
                name: "UPSTREAM_URL",
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            token,
            public_host,
        })
    }

    /// Builds the transport from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(
            config.upstream_url.clone(),
            &config.api_token,
            &config.public_host,
            config.upstream_timeout,
        )
    }

    /// Origin URL for a request path and query.
    pub fn target_url(&self, path_and_query: &str) -> Result<Url, ProxyError> {
        self.base_url
            .join(path_and_query)
            .map_err(|e| ProxyError::Transport(format!("invalid upstream url: {e}")))
    }

    fn forward_headers(&self, incoming: &HeaderMap) -> HeaderMap {
        let mut headers = strip_hop_by_hop(incoming);
        headers.remove(header::HOST);
        headers.insert(header::AUTHORIZATION, self.token.clone());
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(header::HOST, self.public_host.clone());
        headers.insert(
            HeaderName::from_static(X_FORWARDED_HOST),
            self.public_host.clone(),
        );
        headers
    }
}

#[async_trait]
impl Transport for UpstreamTransport {
    async fn round_trip(&self, req: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let path_and_query = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = self.target_url(path_and_query)?;

        let upstream = self
            .client
            .request(req.method().clone(), url)
            .headers(self.forward_headers(req.headers()))
            .send()
            .await?;

        let mut response = Response::builder().status(upstream.status());
        if let Some(headers) = response.headers_mut() {
            *headers = strip_hop_by_hop(upstream.headers());
        }

        Ok(response.body(Body::from_stream(upstream.bytes_stream()))?)
    }
}

fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers
}
