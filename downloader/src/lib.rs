//! HTTP transport for the crawler.
//!
//! Workers hand a [`Request`] to a [`Downloader`] and get back either a
//! [`Response`] with the body fully read, or a fetch error. The stock
//! implementation is [`HttpDownloader`]; tests swap in their own.

use std::time::Duration;

use log::debug;
use reqwest::Client;
use spindle_core::async_trait;
use spindle_core::error::{Error, Result};
use spindle_core::request::{Method, Request};
use spindle_core::response::Response;

pub mod useragent;

pub use useragent::random_user_agent;

/// Transport settings, fixed when the client is built.
///
/// Connections are not pooled between requests; each fetch dials fresh.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Time allowed for establishing a connection
    pub connect_timeout: Duration,

    /// Interval between TCP keep-alive probes
    pub tcp_keepalive: Duration,

    /// Identification string sent when a request sets none itself
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            tcp_keepalive: Duration::from_secs(30),
            user_agent: format!("spindle/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Trait for transports that execute requests
#[async_trait]
pub trait Downloader: Send + Sync + 'static {
    /// Execute a single request and read the full response body
    async fn download(&self, request: Request) -> Result<Response>;
}

/// HTTP downloader backed by a shared reqwest client
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Build a client with the given transport settings
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .tcp_keepalive(config.tcp_keepalive)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self { client })
    }

    fn build_reqwest_request(&self, request: &Request) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(
            match request.method {
                Method::GET => reqwest::Method::GET,
                Method::POST => reqwest::Method::POST,
                Method::PUT => reqwest::Method::PUT,
                Method::DELETE => reqwest::Method::DELETE,
                Method::HEAD => reqwest::Method::HEAD,
                Method::OPTIONS => reqwest::Method::OPTIONS,
                Method::PATCH => reqwest::Method::PATCH,
            },
            request.url.clone(),
        );

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        // A per-request timeout bounds the whole fetch. Without one the
        // request is limited only by the connect timeout.
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        builder
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, request: Request) -> Result<Response> {
        debug!("fetching {}", request.url);

        let response = self
            .build_reqwest_request(&request)
            .send()
            .await
            .map_err(|e| Error::fetch(request.url.as_str(), e.to_string()))?;

        let status = response.status().as_u16();

        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or("").to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::fetch(request.url.as_str(), e.to_string()))?
            .to_vec();

        Ok(Response::new(request, status, headers, body))
    }
}
