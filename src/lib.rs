//! Rust SDK for the EPREL (European Product Registry for Energy Labelling) API.
//!
//! The client fetches product data from the registry, reconciles the
//! different field names the registry has used over time into stable records,
//! and caches responses to avoid repeated requests.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use eprel::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), eprel::Error> {
//!     let client = Client::builder().api_key("your-api-key").build()?;
//!
//!     match client.product("12345", None).await {
//!         Ok(product) => println!("{:?} {:?}", product.brand_name, product.energy_class),
//!         Err(e) if e.is_not_found() => println!("no such product"),
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```

mod cache;
mod client;
mod config;
mod error;
mod normalize;
mod query;
mod transport;
mod types;
mod version;

pub use cache::{hash_string, keys, Cache, CacheEntry, CachedValue, MemoryCache};
pub use client::{Client, ClientBuilder};
pub use config::{
    ClientConfig, DEFAULT_ASSETS_URL, DEFAULT_BASE_URL, DEFAULT_CACHE_TTL_SECS,
    DEFAULT_TIMEOUT_SECS,
};
pub use error::{Error, Result, LOCAL_FAILURE_STATUS};
pub use normalize::JsonObject;
pub use query::{QueryParams, QueryValue, SearchQuery};
pub use transport::{
    Connector, HttpConnector, HttpTransport, Transport, TransportError, TransportRequest,
    TransportResponse,
};
pub use types::*;
pub use version::{build_user_agent, LATEST_API_VERSION, SDK_VERSION};
