//! HTTP transport seam.
//!
//! The client never talks to the network directly. It asks a [`Connector`]
//! for a [`Transport`] built from the current [`ClientConfig`] and sends
//! plain request values through it. [`HttpConnector`] is the default and
//! produces a `reqwest` backed [`HttpTransport`].

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::version::{pinned_api_version, API_KEY_HEADER, API_VERSION_HEADER};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use std::sync::Arc;
use thiserror::Error;

/// A request as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the base URL, or an absolute `http(s)` URL.
    pub path: String,
    /// Query string pairs, passed through verbatim.
    pub query: Vec<(String, String)>,
}

impl TransportRequest {
    /// A GET request without query parameters.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Replace the query parameters.
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

/// A response as plain data.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `Content-Type` header, if present and readable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// Failure reported by a transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered with an error status.
    ///
    /// Transports may also hand error statuses back as a normal
    /// [`TransportResponse`]; both are classified the same way.
    #[error("HTTP status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error body.
        body: Vec<u8>,
    },

    /// No usable response was received.
    #[error("{0}")]
    Network(String),
}

/// Sends requests to the registry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return whatever the server answered.
    async fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// Builds a [`Transport`] for a configuration.
pub trait Connector: Send + Sync {
    /// Build a transport reflecting `config`.
    fn connect(&self, config: &ClientConfig) -> Result<Arc<dyn Transport>>;
}

impl<F> Connector for F
where
    F: Fn(&ClientConfig) -> Result<Arc<dyn Transport>> + Send + Sync,
{
    fn connect(&self, config: &ClientConfig) -> Result<Arc<dyn Transport>> {
        self(config)
    }
}

/// Default connector producing [`HttpTransport`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn connect(&self, config: &ClientConfig) -> Result<Arc<dyn Transport>> {
        Ok(Arc::new(HttpTransport::new(config)?))
    }
}

/// `reqwest` based transport.
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport with the headers `config` calls for.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, header_value("User-Agent", &config.user_agent)?);

        if let Some(key) = &config.api_key {
            let mut value = header_value("API key", key)?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        }

        if let Some(version) = pinned_api_version(&config.version) {
            headers.insert(
                HeaderName::from_static(API_VERSION_HEADER),
                header_value("API version", version)?,
            );
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::Config(format!("{} is not a valid header value", name)))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let url = self.resolve(&request.path);
        let mut req = self.http_client.request(request.method, &url);
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Network(format!("Request to {} timed out", url))
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?
            .to_vec();

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
