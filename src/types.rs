//! Canonical records returned by the EPREL SDK.
//!
//! Every constructor here is total: missing or mistyped upstream fields
//! become `None` rather than errors.

use crate::normalize::{collect_unknown, Field, JsonObject};
use serde::Serialize;
use serde_json::Value;

const REGISTRATION_NUMBER: Field = Field::new(&["registrationNumber", "eprelRegistrationNumber"]);
const BRAND_NAME: Field = Field::new(&["brandName", "supplierOrTrademark"]);
const MODEL_IDENTIFIER: Field = Field::new(&["modelIdentifier"]);
const ENERGY_CLASS: Field = Field::new(&["energyClass"]);
const ENERGY_CLASS_IMAGE: Field = Field::new(&["energyClassImage"]);
const PRODUCT_GROUP: Field = Field::new(&["productGroup"]);
const STATUS: Field = Field::new(&["status"]);
const BLOCKED: Field = Field::new(&["blocked"]);
const ORG_VERIFICATION_STATUS: Field = Field::new(&["orgVerificationStatus"]);
const TRADEMARK_VERIFICATION_STATUS: Field = Field::new(&["trademarkVerificationStatus"]);
const ENERGY_LABEL_URL: Field = Field::new(&["energyLabelUrl"]);
const PRODUCT_INFORMATION_SHEET_URL: Field = Field::new(&["productInformationSheetUrl"]);
const TECHNICAL_PARAMETERS: Field = Field::new(&["technicalParameters"]);

/// Fields recognized on a product detail; everything else is a technical parameter.
const DETAIL_FIELDS: [&Field; 13] = [
    &REGISTRATION_NUMBER,
    &BRAND_NAME,
    &MODEL_IDENTIFIER,
    &ENERGY_CLASS,
    &ENERGY_CLASS_IMAGE,
    &PRODUCT_GROUP,
    &STATUS,
    &BLOCKED,
    &ORG_VERIFICATION_STATUS,
    &TRADEMARK_VERIFICATION_STATUS,
    &ENERGY_LABEL_URL,
    &PRODUCT_INFORMATION_SHEET_URL,
    &TECHNICAL_PARAMETERS,
];

const VERIFIED: &str = "VERIFIED";

/// Apply `f` to `value` if it is an object, otherwise to an empty object.
fn with_object<T>(value: &Value, f: impl FnOnce(&JsonObject) -> T) -> T {
    match value.as_object() {
        Some(object) => f(object),
        None => f(&JsonObject::new()),
    }
}

/// Normalize the object elements of a JSON array, skipping anything else.
fn objects<T>(value: Option<&Value>, f: impl Fn(&JsonObject) -> T) -> Vec<T> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_object).map(f).collect())
        .unwrap_or_default()
}

/// A product as it appears in search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    /// EPREL registration number.
    pub registration_number: Option<String>,
    /// Brand or supplier name.
    pub brand_name: Option<String>,
    /// Model identifier.
    pub model_identifier: Option<String>,
    /// Energy efficiency class.
    pub energy_class: Option<String>,
    /// Product group code.
    pub product_group: Option<String>,
}

impl ProductSummary {
    /// Build from a decoded JSON object.
    pub fn from_object(object: &JsonObject) -> Self {
        Self {
            registration_number: REGISTRATION_NUMBER.string(object),
            brand_name: BRAND_NAME.string(object),
            model_identifier: MODEL_IDENTIFIER.string(object),
            energy_class: ENERGY_CLASS.string(object),
            product_group: PRODUCT_GROUP.string(object),
        }
    }

    /// Build from any JSON value; non-objects yield an empty summary.
    pub fn from_value(value: &Value) -> Self {
        with_object(value, Self::from_object)
    }
}

/// Full product record.
///
/// Upstream fields that have no canonical slot are kept verbatim in
/// [`technical_parameters`](Self::technical_parameters).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    /// EPREL registration number.
    pub registration_number: Option<String>,
    /// Brand or supplier name.
    pub brand_name: Option<String>,
    /// Model identifier.
    pub model_identifier: Option<String>,
    /// Energy efficiency class.
    pub energy_class: Option<String>,
    /// Energy class image file name.
    pub energy_class_image: Option<String>,
    /// Product group code.
    pub product_group: Option<String>,
    /// Registration status.
    pub status: Option<String>,
    /// Whether the registration is blocked.
    pub blocked: bool,
    /// Supplier organisation verification status.
    pub org_verification_status: Option<String>,
    /// Trademark verification status.
    pub trademark_verification_status: Option<String>,
    /// Energy label URL.
    pub energy_label_url: Option<String>,
    /// Product information sheet URL.
    pub product_information_sheet_url: Option<String>,
    /// Group-specific parameters plus any unrecognized upstream fields.
    pub technical_parameters: Option<JsonObject>,
}

impl ProductDetail {
    /// Build from a decoded JSON object.
    pub fn from_object(object: &JsonObject) -> Self {
        Self {
            registration_number: REGISTRATION_NUMBER.string(object),
            brand_name: BRAND_NAME.string(object),
            model_identifier: MODEL_IDENTIFIER.string(object),
            energy_class: ENERGY_CLASS.string(object),
            energy_class_image: ENERGY_CLASS_IMAGE.string(object),
            product_group: PRODUCT_GROUP.string(object),
            status: STATUS.string(object),
            blocked: BLOCKED.truthy(object),
            org_verification_status: ORG_VERIFICATION_STATUS.string(object),
            trademark_verification_status: TRADEMARK_VERIFICATION_STATUS.string(object),
            energy_label_url: ENERGY_LABEL_URL.string(object),
            product_information_sheet_url: PRODUCT_INFORMATION_SHEET_URL.string(object),
            technical_parameters: collect_unknown(
                object,
                &DETAIL_FIELDS,
                TECHNICAL_PARAMETERS.object(object),
            ),
        }
    }

    /// Build from any JSON value; non-objects yield an empty record.
    pub fn from_value(value: &Value) -> Self {
        with_object(value, Self::from_object)
    }

    /// Whether the supplier organisation is verified.
    pub fn is_verified(&self) -> bool {
        self.org_verification_status.as_deref() == Some(VERIFIED)
    }

    /// Whether the trademark is verified.
    pub fn is_trademark_verified(&self) -> bool {
        self.trademark_verification_status.as_deref() == Some(VERIFIED)
    }

    /// Look up a technical parameter by name.
    pub fn technical_parameter(&self, name: &str) -> Option<&Value> {
        self.technical_parameters.as_ref()?.get(name)
    }
}

/// A product group (category) known to the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductGroup {
    /// Group code, e.g. `AIR_CONDITIONER`.
    pub code: Option<String>,
    /// Code used in URLs, e.g. `airconditioners`.
    pub url_code: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Governing regulation.
    pub regulation: Option<String>,
}

impl ProductGroup {
    /// Build from a decoded JSON object.
    pub fn from_object(object: &JsonObject) -> Self {
        const CODE: Field = Field::new(&["code"]);
        const URL_CODE: Field = Field::new(&["url_code"]);
        const NAME: Field = Field::new(&["name"]);
        const REGULATION: Field = Field::new(&["regulation"]);

        Self {
            code: CODE.string(object),
            url_code: URL_CODE.string(object),
            name: NAME.string(object),
            regulation: REGULATION.string(object),
        }
    }

    /// Build from any JSON value; non-objects yield an empty group.
    pub fn from_value(value: &Value) -> Self {
        with_object(value, Self::from_object)
    }
}

/// A page of cross-group search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    /// Products on this page.
    pub content: Vec<ProductSummary>,
    /// Total matching products.
    pub total_elements: Option<i64>,
    /// Total number of pages.
    pub total_pages: Option<i64>,
    /// Page size.
    pub size: Option<i64>,
    /// Zero-based page number.
    pub page_number: Option<i64>,
}

impl ProductPage {
    /// Build from a decoded JSON object.
    pub fn from_object(object: &JsonObject) -> Self {
        const TOTAL_ELEMENTS: Field = Field::new(&["totalElements"]);
        const TOTAL_PAGES: Field = Field::new(&["totalPages"]);
        const SIZE: Field = Field::new(&["size"]);
        const NUMBER: Field = Field::new(&["number"]);

        Self {
            content: objects(object.get("content"), ProductSummary::from_object),
            total_elements: TOTAL_ELEMENTS.int(object),
            total_pages: TOTAL_PAGES.int(object),
            size: SIZE.int(object),
            page_number: NUMBER.int(object),
        }
    }

    /// Build from any JSON value; non-objects yield an empty page.
    pub fn from_value(value: &Value) -> Self {
        with_object(value, Self::from_object)
    }
}

/// A page of search results within one product group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductGroupPage {
    /// Products on this page.
    pub hits: Vec<ProductSummary>,
    /// Page size.
    pub size: Option<i64>,
    /// Offset of the first hit.
    pub offset: Option<i64>,
}

impl ProductGroupPage {
    /// Build from a decoded JSON object.
    pub fn from_object(object: &JsonObject) -> Self {
        const SIZE: Field = Field::new(&["size"]);
        const OFFSET: Field = Field::new(&["offset"]);

        Self {
            hits: objects(object.get("hits"), ProductSummary::from_object),
            size: SIZE.int(object),
            offset: OFFSET.int(object),
        }
    }

    /// Build from any JSON value; non-objects yield an empty page.
    pub fn from_value(value: &Value) -> Self {
        with_object(value, Self::from_object)
    }
}

/// Location of a label or fiche, returned instead of the file itself when
/// the registry answers with JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressResponse {
    /// URL of the asset.
    pub address: Option<String>,
}

impl AddressResponse {
    /// Build from a decoded JSON object.
    pub fn from_object(object: &JsonObject) -> Self {
        const ADDRESS: Field = Field::new(&["address"]);

        Self {
            address: ADDRESS.string(object),
        }
    }

    /// Build from any JSON value; non-objects yield an empty address.
    pub fn from_value(value: &Value) -> Self {
        with_object(value, Self::from_object)
    }
}

/// A label or fiche: either its address or the file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetResponse {
    /// The registry answered with JSON pointing at the asset.
    Address(AddressResponse),
    /// The raw asset body (PNG, PDF, SVG, ...).
    Raw(Vec<u8>),
}

impl AssetResponse {
    /// The address, if the registry answered with one.
    pub fn address(&self) -> Option<&str> {
        match self {
            AssetResponse::Address(a) => a.address.as_deref(),
            AssetResponse::Raw(_) => None,
        }
    }

    /// The raw body, if the registry answered with the asset itself.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AssetResponse::Raw(bytes) => Some(bytes),
            AssetResponse::Address(_) => None,
        }
    }
}

/// Result of a lookup that may match one product or several.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductLookup {
    /// The registry answered with a single product.
    Single(ProductDetail),
    /// The registry answered with a list of products.
    Many(Vec<ProductDetail>),
}

impl ProductLookup {
    /// Flatten into a list regardless of shape.
    pub fn into_vec(self) -> Vec<ProductDetail> {
        match self {
            ProductLookup::Single(product) => vec![product],
            ProductLookup::Many(products) => products,
        }
    }

    /// Classify a decoded body by shape.
    ///
    /// Returns `None` for anything that is neither an object nor an array
    /// containing objects.
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(ProductLookup::Single(ProductDetail::from_object(object))),
            Value::Array(items) if items.iter().any(Value::is_object) => Some(ProductLookup::Many(
                objects(Some(value), ProductDetail::from_object),
            )),
            _ => None,
        }
    }
}
