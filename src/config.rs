//! Client configuration.

use crate::cache::hash_string;
use crate::version::build_user_agent;
use std::time::Duration;

/// Default registry API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://eprel.ec.europa.eu/api";

/// Default location of static energy class images.
pub const DEFAULT_ASSETS_URL: &str =
    "https://ec.europa.eu/assets/move-ener/eprel/EPREL%20Public/Nested-labels%20thumbnails/";

/// Default cache time-to-live.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Default request timeout enforced by the HTTP transport.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings a transport is built from.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Registry API base URL, without a trailing slash.
    pub base_url: String,
    /// Base URL static images are resolved against.
    pub assets_url: String,
    /// Static API key sent with every request.
    pub api_key: Option<String>,
    /// API version tag; `latest` sends no version header.
    pub version: String,
    /// Time-to-live for cached responses.
    pub cache_ttl: Duration,
    /// Request timeout.
    pub timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
}

impl ClientConfig {
    /// Identity of the settings that shape a transport.
    ///
    /// Two configs with the same fingerprint can share a transport. The
    /// assets URL is excluded: image requests carry it in full.
    pub fn fingerprint(&self) -> String {
        hash_string(&format!(
            "{}\n{:?}\n{}\n{}\n{}\n{}",
            self.base_url,
            self.api_key,
            self.version,
            self.cache_ttl.as_secs(),
            self.timeout.as_millis(),
            self.user_agent,
        ))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            assets_url: DEFAULT_ASSETS_URL.to_string(),
            api_key: None,
            version: crate::version::LATEST_API_VERSION.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: build_user_agent(None),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("assets_url", &self.assets_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("version", &self.version)
            .field("cache_ttl", &self.cache_ttl)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
