//! Main EPREL client implementation.

use crate::cache::{keys, Cache, CacheEntry, CachedValue, MemoryCache};
use crate::config::ClientConfig;
use crate::error::{classify_status, Error, Result};
use crate::query::SearchQuery;
use crate::transport::{
    Connector, HttpConnector, Transport, TransportError, TransportRequest, TransportResponse,
};
use crate::types::*;
use crate::version::build_user_agent;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, error, warn};
use urlencoding::encode;

/// Builder for constructing a [`Client`].
pub struct ClientBuilder {
    config: ClientConfig,
    cache: Option<Arc<dyn Cache>>,
    connector: Option<Arc<dyn Connector>>,
    user_agent_suffix: Option<String>,
}

impl ClientBuilder {
    /// Create a new client builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            cache: None,
            connector: None,
            user_agent_suffix: None,
        }
    }

    /// Set the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the base URL energy class images are fetched from.
    pub fn assets_url(mut self, url: impl Into<String>) -> Self {
        self.config.assets_url = url.into();
        self
    }

    /// Set the static API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    /// Pin an API version (`latest` by default).
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    /// Set how long responses stay cached.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set a custom cache implementation.
    pub fn cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set a custom transport factory.
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Use a fixed transport regardless of configuration.
    pub fn transport(self, transport: Arc<dyn Transport>) -> Self {
        self.connector(Arc::new(move |_: &ClientConfig| -> Result<Arc<dyn Transport>> {
            Ok(Arc::clone(&transport))
        }))
    }

    /// Set a custom User-Agent suffix.
    pub fn user_agent_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.user_agent_suffix = Some(suffix.into());
        self
    }

    /// Build the client.
    pub fn build(mut self) -> Result<Client> {
        if self.config.base_url.is_empty() {
            return Err(Error::Config("Base URL is required".into()));
        }

        warn_if_insecure(&self.config.base_url);

        self.config.user_agent = build_user_agent(self.user_agent_suffix.as_deref());

        let cache: Arc<dyn Cache> = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryCache::default()));
        let connector: Arc<dyn Connector> =
            self.connector.unwrap_or_else(|| Arc::new(HttpConnector));

        Ok(Client {
            config: self.config,
            cache,
            connector,
            transport: RwLock::new(None),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn warn_if_insecure(base_url: &str) {
    if !base_url.starts_with("https://") {
        warn!(
            base_url = %base_url,
            "API base URL is not using HTTPS. This is insecure."
        );
    }
}

/// A transport together with the configuration it was built from.
struct BuiltTransport {
    fingerprint: String,
    transport: Arc<dyn Transport>,
}

/// Expected top-level kind of a JSON body.
#[derive(Clone, Copy)]
enum Shape {
    Object,
    Array,
}

impl Shape {
    fn check(self, value: &Value) -> Result<()> {
        let (ok, expected) = match self {
            Shape::Object => (value.is_object(), "an object"),
            Shape::Array => (value.is_array(), "an array"),
        };
        if ok {
            Ok(())
        } else {
            Err(Error::local(format!(
                "Unexpected response shape: expected {}",
                expected
            )))
        }
    }
}

/// The EPREL registry client.
///
/// # Example
///
/// ```rust,no_run
/// use eprel::{Client, SearchQuery};
///
/// #[tokio::main]
/// async fn main() -> Result<(), eprel::Error> {
///     let client = Client::builder().api_key("your-api-key").build()?;
///
///     let query = SearchQuery::new().limit(10).sort(0, "energyClass", "asc")?;
///     let page = client.products_by_group("ovens", &query).await?;
///
///     for hit in page.hits {
///         println!("{:?} {:?}", hit.registration_number, hit.energy_class);
///     }
///     Ok(())
/// }
/// ```
pub struct Client {
    config: ClientConfig,
    cache: Arc<dyn Cache>,
    connector: Arc<dyn Connector>,
    transport: RwLock<Option<BuiltTransport>>,
}

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    // === Configuration ===

    /// Current configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Time-to-live applied to cached responses.
    pub fn cache_ttl(&self) -> Duration {
        self.config.cache_ttl
    }

    /// Change the API base URL.
    pub fn set_base_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        warn_if_insecure(&self.config.base_url);
        self
    }

    /// Change the base URL energy class images are fetched from.
    pub fn set_assets_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.config.assets_url = url.into();
        self
    }

    /// Change the static API key.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> &mut Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    /// Change the pinned API version.
    pub fn set_version(&mut self, version: impl Into<String>) -> &mut Self {
        self.config.version = version.into();
        self
    }

    /// Change the cache time-to-live.
    pub fn set_cache_ttl(&mut self, ttl: Duration) -> &mut Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Change the request timeout.
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.config.timeout = timeout;
        self
    }

    /// Replace the cache store.
    pub fn set_cache(&mut self, cache: Arc<dyn Cache>) -> &mut Self {
        self.cache = cache;
        self
    }

    // === Health ===

    /// Check whether the registry is reachable.
    ///
    /// Never fails: any error is logged and reported as `false`.
    pub async fn ping(&self) -> bool {
        match self.send(TransportRequest::get("/ping"), None).await {
            Ok(response) => response.status == 200,
            Err(err) => {
                error!(error = %err, "Ping failed");
                false
            }
        }
    }

    // === Catalogue ===

    /// List all product groups.
    pub async fn product_groups(&self) -> Result<Vec<ProductGroup>> {
        let value = self
            .cached_json(
                &keys::product_groups(),
                TransportRequest::get("/product-groups"),
                Shape::Array,
                None,
            )
            .await
            .map_err(|e| report("fetch product groups", e))?;

        Ok(value
            .as_array()
            .map(|groups| {
                groups
                    .iter()
                    .filter_map(Value::as_object)
                    .map(ProductGroup::from_object)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Search products across all groups.
    pub async fn products(&self, query: &SearchQuery) -> Result<ProductPage> {
        let request = TransportRequest::get("/products").with_query(query.to_pairs());
        let value = self
            .cached_json(&keys::products(query.params()), request, Shape::Object, None)
            .await
            .map_err(|e| report("fetch products", e))?;

        Ok(ProductPage::from_value(&value))
    }

    /// Search products within one product group.
    pub async fn products_by_group(
        &self,
        product_group: &str,
        query: &SearchQuery,
    ) -> Result<ProductGroupPage> {
        let request = TransportRequest::get(format!("/products/{}", encode(product_group)))
            .with_query(query.to_pairs());
        let value = self
            .cached_json(
                &keys::group_products(product_group, query.params()),
                request,
                Shape::Object,
                None,
            )
            .await
            .map_err(|e| report("fetch group products", e))?;

        Ok(ProductGroupPage::from_value(&value))
    }

    // === Products ===

    /// Get a product by registration number, optionally scoped by group.
    ///
    /// Fails with [`Error::NotFound`] if the registry does not know it.
    pub async fn product(
        &self,
        registration_number: &str,
        product_group: Option<&str>,
    ) -> Result<ProductDetail> {
        let not_found = format!("Product not found: {}", registration_number);
        let value = self
            .cached_json(
                &keys::product(registration_number, product_group),
                TransportRequest::get(product_path(registration_number, product_group)),
                Shape::Object,
                Some(&not_found),
            )
            .await
            .map_err(|e| report("fetch product", e))?;

        Ok(ProductDetail::from_value(&value))
    }

    /// Get the energy label of a product, as a file or its address.
    pub async fn labels(
        &self,
        registration_number: &str,
        product_group: Option<&str>,
        query: &SearchQuery,
    ) -> Result<AssetResponse> {
        let path = format!("{}/labels", product_path(registration_number, product_group));
        let not_found = format!("Labels not found for product: {}", registration_number);
        self.asset(path, query, &not_found)
            .await
            .map_err(|e| report("fetch labels", e))
    }

    /// Get the product information sheet, as a file or its address.
    pub async fn fiches(
        &self,
        registration_number: &str,
        product_group: Option<&str>,
        query: &SearchQuery,
    ) -> Result<AssetResponse> {
        let path = format!("{}/fiches", product_path(registration_number, product_group));
        let not_found = format!("Fiches not found for product: {}", registration_number);
        self.asset(path, query, &not_found)
            .await
            .map_err(|e| report("fetch fiches", e))
    }

    /// Get the nested label image of a product.
    pub async fn nested_label(&self, registration_number: &str) -> Result<Vec<u8>> {
        let path = format!("/product/{}/nested-label", encode(registration_number));
        let not_found = format!("Nested label not found for product: {}", registration_number);
        self.send(TransportRequest::get(path), Some(&not_found))
            .await
            .map(|response| response.body)
            .map_err(|e| report("fetch nested label", e))
    }

    /// Get the energy class arrow with scale of a product.
    pub async fn class_arrow_with_scale(&self, registration_number: &str) -> Result<Vec<u8>> {
        let path = format!(
            "/product/{}/class-arrow-with-scale",
            encode(registration_number)
        );
        let not_found = format!(
            "Class arrow with scale not found for product: {}",
            registration_number
        );
        self.send(TransportRequest::get(path), Some(&not_found))
            .await
            .map(|response| response.body)
            .map_err(|e| report("fetch class arrow with scale", e))
    }

    /// Look up products by GTIN.
    ///
    /// The registry answers with either one product or a list of them for
    /// the same query; both are accepted.
    pub async fn product_by_gtin(&self, gtin: &str) -> Result<ProductLookup> {
        let path = format!("/product/gtin/{}", encode(gtin));
        let not_found = format!("Product not found for GTIN: {}", gtin);
        let lookup = async {
            let response = self
                .send(TransportRequest::get(path), Some(&not_found))
                .await?;
            let value = decode_json(&response.body)?;
            ProductLookup::from_value(&value)
                .ok_or_else(|| Error::local("Invalid response format from GTIN search"))
        };

        lookup
            .await
            .map_err(|e| report("fetch product by GTIN", e))
    }

    /// Export every product of a group in the registry's bulk format.
    pub async fn export_products(&self, product_group: &str) -> Result<Vec<u8>> {
        let path = format!("/exportProducts/{}", encode(product_group));
        self.send(TransportRequest::get(path), None)
            .await
            .map(|response| response.body)
            .map_err(|e| report("export products", e))
    }

    /// Get a static energy class image from the assets location.
    ///
    /// `file_name` is appended to the assets URL as given, so it must already
    /// be URL-safe. Images are cached as raw bytes.
    pub async fn energy_class_image(&self, file_name: &str) -> Result<Vec<u8>> {
        let key = keys::energy_class_image(file_name);
        if let Some(CacheEntry {
            value: CachedValue::Bytes(bytes),
            ..
        }) = self.cache.get(&key)
        {
            debug!(key = %key, "Cache hit");
            return Ok(bytes);
        }

        let url = format!("{}{}", self.config.assets_url, file_name);
        let body = self
            .send(TransportRequest::get(url), None)
            .await
            .map(|response| response.body)
            .map_err(|e| report("fetch energy class image", e))?;

        self.cache.set(
            &key,
            CacheEntry::new(CachedValue::Bytes(body.clone()), self.config.cache_ttl),
        );
        Ok(body)
    }

    // === Internal methods ===

    /// The transport for the current configuration, rebuilt if the
    /// configuration changed since it was last built.
    fn transport(&self) -> Result<Arc<dyn Transport>> {
        let fingerprint = self.config.fingerprint();

        if let Some(built) = self
            .transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|built| built.fingerprint == fingerprint)
        {
            return Ok(Arc::clone(&built.transport));
        }

        let mut slot = self
            .transport
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(built) = slot
            .as_ref()
            .filter(|built| built.fingerprint == fingerprint)
        {
            return Ok(Arc::clone(&built.transport));
        }

        debug!(base_url = %self.config.base_url, "Building transport");
        let transport = self.connector.connect(&self.config)?;
        *slot = Some(BuiltTransport {
            fingerprint,
            transport: Arc::clone(&transport),
        });
        Ok(transport)
    }

    /// Send one request and classify the outcome.
    async fn send(
        &self,
        request: TransportRequest,
        not_found: Option<&str>,
    ) -> Result<TransportResponse> {
        let transport = self.transport()?;
        debug!(path = %request.path, "Sending request");

        match transport.send(request).await {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => Err(classify_status(response.status, &response.body, not_found)),
            Err(TransportError::Status { status, body }) => {
                Err(classify_status(status, &body, not_found))
            }
            Err(TransportError::Network(message)) => Err(Error::local(message)),
        }
    }

    /// Serve a decoded JSON body from the cache, or fetch and cache it.
    ///
    /// The cache holds the body as received so hits and misses go through
    /// the same normalization.
    async fn cached_json(
        &self,
        key: &str,
        request: TransportRequest,
        shape: Shape,
        not_found: Option<&str>,
    ) -> Result<Value> {
        if let Some(CacheEntry {
            value: CachedValue::Json(value),
            ..
        }) = self.cache.get(key)
        {
            debug!(key = %key, "Cache hit");
            return Ok(value);
        }
        debug!(key = %key, "Cache miss");

        let response = self.send(request, not_found).await?;
        let value = decode_json(&response.body)?;
        shape.check(&value)?;

        self.cache.set(
            key,
            CacheEntry::new(CachedValue::Json(value.clone()), self.config.cache_ttl),
        );
        Ok(value)
    }

    /// Fetch a label or fiche, dispatching on the response content type.
    async fn asset(
        &self,
        path: String,
        query: &SearchQuery,
        not_found: &str,
    ) -> Result<AssetResponse> {
        let request = TransportRequest::get(path).with_query(query.to_pairs());
        let response = self.send(request, Some(not_found)).await?;

        let is_json = response
            .content_type()
            .is_some_and(|ct| ct.contains("application/json"));
        if is_json {
            let value = decode_json(&response.body)?;
            Ok(AssetResponse::Address(AddressResponse::from_value(&value)))
        } else {
            Ok(AssetResponse::Raw(response.body))
        }
    }
}

fn product_path(registration_number: &str, product_group: Option<&str>) -> String {
    match product_group {
        Some(group) => format!("/products/{}/{}", encode(group), encode(registration_number)),
        None => format!("/product/{}", encode(registration_number)),
    }
}

fn decode_json(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|e| Error::local(format!("Invalid JSON response: {}", e)))
}

/// Log a failed operation and attach it to the error message.
fn report(operation: &str, err: Error) -> Error {
    let err = err.context(operation);
    match &err {
        Error::NotFound(message) => debug!(message = %message, "Resource not found"),
        other => error!(error = %other, "Failed to {}", operation),
    }
    err
}
