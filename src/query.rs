//! Search parameter builder.

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Highest sort slot the registry accepts.
const MAX_SORT_INDEX: usize = 2;

/// A single query parameter value.
///
/// Booleans are not represented: the registry expects the literal strings
/// `"true"` and `"false"`, so they are stored as [`QueryValue::String`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// Text value.
    String(String),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::String(s) => f.write_str(s),
            QueryValue::Int(i) => write!(f, "{}", i),
            QueryValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::String(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::String(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Int(value.into())
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Int(value.into())
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::String(bool_literal(value).to_string())
    }
}

fn bool_literal(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Flat parameter set sent as the query string.
pub type QueryParams = BTreeMap<String, QueryValue>;

/// Fluent builder for product search parameters.
///
/// # Example
///
/// ```rust
/// use eprel::SearchQuery;
///
/// let query = SearchQuery::new()
///     .page(2)
///     .limit(10)
///     .include_old_products(true)
///     .sort(0, "energyClass", "desc")?
///     .with_filter("heatSourceGas", true);
///
/// assert_eq!(query.get("order0").map(|v| v.to_string()), Some("DESC".into()));
/// # Ok::<(), eprel::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    params: QueryParams,
}

impl SearchQuery {
    /// Create an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Page number (`_page`).
    pub fn page(self, page: u32) -> Self {
        self.with_filter("_page", page)
    }

    /// Page size (`_limit`).
    pub fn limit(self, limit: u32) -> Self {
        self.with_filter("_limit", limit)
    }

    /// Filter by model identifier.
    pub fn model_identifier(self, identifier: impl Into<String>) -> Self {
        self.with_filter("modelIdentifier", QueryValue::String(identifier.into()))
    }

    /// Filter by supplier or trademark.
    pub fn supplier_or_trademark(self, supplier: impl Into<String>) -> Self {
        self.with_filter("supplierOrTrademark", QueryValue::String(supplier.into()))
    }

    /// Filter by GTIN.
    pub fn gtin_identifier(self, gtin: impl Into<String>) -> Self {
        self.with_filter("gtinIdentifier", QueryValue::String(gtin.into()))
    }

    /// Include products that are no longer placed on the market.
    pub fn include_old_products(self, include: bool) -> Self {
        self.with_filter("includeOldProducts", include)
    }

    /// Set sort slot `index` (0 to 2) to `field` in the given direction.
    ///
    /// The direction is uppercased. Fails with [`Error::Config`] when the
    /// slot is out of range.
    pub fn sort(mut self, index: usize, field: impl Into<String>, order: &str) -> Result<Self> {
        if index > MAX_SORT_INDEX {
            return Err(Error::Config(format!(
                "Sort index must be between 0 and {}, got {}",
                MAX_SORT_INDEX, index
            )));
        }

        self.params
            .insert(format!("sort{}", index), QueryValue::String(field.into()));
        self.params.insert(
            format!("order{}", index),
            QueryValue::String(order.to_uppercase()),
        );
        Ok(self)
    }

    /// Sort slot `index` ascending.
    pub fn sort_asc(self, index: usize, field: impl Into<String>) -> Result<Self> {
        self.sort(index, field, "ASC")
    }

    /// Set an arbitrary named filter.
    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Look up a single parameter.
    pub fn get(&self, name: &str) -> Option<&QueryValue> {
        self.params.get(name)
    }

    /// Whether no parameter has been set.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Snapshot of the accumulated parameters.
    pub fn to_params(&self) -> QueryParams {
        self.params.clone()
    }

    /// Parameters as query-string pairs.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    pub(crate) fn params(&self) -> &QueryParams {
        &self.params
    }
}

impl From<QueryParams> for SearchQuery {
    fn from(params: QueryParams) -> Self {
        Self { params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_uppercases_order() {
        let query = SearchQuery::new().sort(0, "energyClass", "desc").unwrap();
        let params = query.to_params();
        assert_eq!(params.len(), 2);
        assert_eq!(params["sort0"], QueryValue::String("energyClass".into()));
        assert_eq!(params["order0"], QueryValue::String("DESC".into()));

        let query = SearchQuery::new().sort_asc(2, "modelIdentifier").unwrap();
        assert_eq!(query.get("order2"), Some(&QueryValue::String("ASC".into())));
    }

    #[test]
    fn test_sort_index_out_of_range() {
        let err = SearchQuery::new().sort(3, "x", "ASC").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_booleans_are_literal_strings() {
        let query = SearchQuery::new()
            .include_old_products(true)
            .with_filter("heatSourceGas", false);
        assert_eq!(
            query.get("includeOldProducts"),
            Some(&QueryValue::String("true".into()))
        );
        assert_eq!(
            query.get("heatSourceGas"),
            Some(&QueryValue::String("false".into()))
        );
    }

    #[test]
    fn test_to_pairs() {
        let query = SearchQuery::new()
            .page(2)
            .limit(10)
            .model_identifier("test-id")
            .with_filter("ratio", 1.5);
        let pairs = query.to_pairs();
        assert!(pairs.contains(&("_page".into(), "2".into())));
        assert!(pairs.contains(&("_limit".into(), "10".into())));
        assert!(pairs.contains(&("modelIdentifier".into(), "test-id".into())));
        assert!(pairs.contains(&("ratio".into(), "1.5".into())));
    }

    #[test]
    fn test_later_value_replaces_earlier() {
        let query = SearchQuery::new().page(1).page(4);
        assert_eq!(query.get("_page"), Some(&QueryValue::Int(4)));
    }
}
