//! Response cache and cache key derivation.

use crate::query::QueryParams;
use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Trait for cache implementations.
pub trait Cache: Send + Sync {
    /// Get a live entry by key. Expired entries are reported as misses.
    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Store an entry in the cache.
    fn set(&self, key: &str, entry: CacheEntry);

    /// Delete an entry from the cache.
    fn delete(&self, key: &str);
}

/// A cached payload, stored before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// A decoded JSON body.
    Json(Value),
    /// A raw body.
    Bytes(Vec<u8>),
}

/// A cached entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached value.
    pub value: CachedValue,
    /// When the entry stops being served. `None` never expires.
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    /// Create an entry that lives for `ttl`.
    ///
    /// A `ttl` too large to represent as an instant yields an entry that
    /// never expires.
    pub fn new(value: CachedValue, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    /// Whether the entry has outlived its time-to-live.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Instant::now() >= expires_at)
    }
}

/// Hash a string using SHA-256 (truncated to 16 chars for cache keys).
pub fn hash_string(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let result = hasher.finalize();
    // Return first 16 hex chars (64 bits of entropy)
    hex::encode(&result[..8])
}

/// Hash the canonical JSON form of `value`.
fn hash_canonical<T: Serialize + ?Sized>(value: &T) -> String {
    let canonical = serde_json::to_string(value).unwrap_or_default();
    hash_string(&canonical)
}

/// Parameters as the strings sent on the wire, in key order.
///
/// JSON has no spelling for NaN or infinity, so hashing the values themselves
/// would fold distinct queries onto one key.
fn wire_pairs(params: &QueryParams) -> Vec<(&str, String)> {
    params
        .iter()
        .map(|(name, value)| (name.as_str(), value.to_string()))
        .collect()
}

/// Cache key derivation for each cacheable operation.
pub mod keys {
    use super::*;

    /// Key for the product group list.
    pub fn product_groups() -> String {
        "eprel_product_groups".to_string()
    }

    /// Key for a cross-group product search.
    pub fn products(params: &QueryParams) -> String {
        format!("eprel_products_{}", hash_canonical(&wire_pairs(params)))
    }

    /// Key for a search within one product group.
    pub fn group_products(group: &str, params: &QueryParams) -> String {
        format!("eprel_group_products_{}", hash_canonical(&json!([group, wire_pairs(params)])))
    }

    /// Key for a single product, optionally scoped by group.
    ///
    /// A missing group is encoded as JSON `null`, which no group name can
    /// produce.
    pub fn product(registration_number: &str, group: Option<&str>) -> String {
        format!(
            "eprel_product_{}",
            hash_canonical(&json!([group, registration_number]))
        )
    }

    /// Key for a static energy class image.
    pub fn energy_class_image(file_name: &str) -> String {
        format!("eprel_energy_arrow_{}", hash_string(file_name))
    }
}

/// In-memory cache with TTL expiry and FIFO eviction.
pub struct MemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
    order: Arc<RwLock<VecDeque<String>>>,
    max_entries: usize,
}

impl MemoryCache {
    /// Create a new memory cache with the given maximum entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::with_capacity(max_entries))),
            order: Arc::new(RwLock::new(VecDeque::with_capacity(max_entries))),
            max_entries: max_entries.max(1),
        }
    }

    /// Get the current number of entries, expired ones included.
    pub fn size(&self) -> usize {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        let mut order = self.order.write().unwrap_or_else(PoisonError::into_inner);
        store.clear();
        order.clear();
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        let entry = store.get(key)?;

        if entry.is_expired() {
            return None;
        }

        Some(entry.clone())
    }

    fn set(&self, key: &str, entry: CacheEntry) {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        let mut order = self.order.write().unwrap_or_else(PoisonError::into_inner);

        if !store.contains_key(key) {
            while store.len() >= self.max_entries {
                match order.pop_front() {
                    Some(oldest) => {
                        store.remove(&oldest);
                    }
                    None => break,
                }
            }
            order.push_back(key.to_string());
        }

        store.insert(key.to_string(), entry);
    }

    fn delete(&self, key: &str) {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        let mut order = self.order.write().unwrap_or_else(PoisonError::into_inner);

        store.remove(key);
        order.retain(|k| k != key);
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(256)
    }
}
