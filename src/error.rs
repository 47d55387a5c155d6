//! Error types for the EPREL SDK.

use thiserror::Error;

/// Result type for EPREL operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Status reported for failures that originate on the client side.
pub const LOCAL_FAILURE_STATUS: u16 = 500;

/// Error types for the EPREL SDK.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested resource does not exist.
    ///
    /// Only raised by operations that address a single resource by key.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request failed for any other reason.
    #[error("API error ({status}): {message}")]
    Api {
        /// Upstream HTTP status, or 500 when the failure was local.
        status: u16,
        /// Error message
        message: String,
    },

    /// Invalid client-side input, rejected before any request was sent.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an API error for a failure that happened on this side of the wire.
    pub(crate) fn local(message: impl Into<String>) -> Self {
        Error::Api {
            status: LOCAL_FAILURE_STATUS,
            message: message.into(),
        }
    }

    /// The HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::NotFound(_) => Some(404),
            Error::Api { status, .. } => Some(*status),
            Error::Config(_) => None,
        }
    }

    /// Whether this error means the addressed resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Prefix the message with the failing operation.
    pub(crate) fn context(self, operation: &str) -> Self {
        match self {
            Error::Api { status, message } => Error::Api {
                status,
                message: format!("Failed to {}: {}", operation, message),
            },
            other => other,
        }
    }
}

/// Classify a non-success HTTP response.
///
/// `not_found` is the message used when a 404 should surface as
/// [`Error::NotFound`]; operations that do not address a single resource pass
/// `None` and get a plain [`Error::Api`] instead.
pub(crate) fn classify_status(status: u16, body: &[u8], not_found: Option<&str>) -> Error {
    if status == 404 {
        if let Some(message) = not_found {
            return Error::NotFound(message.to_string());
        }
    }

    Error::Api {
        status,
        message: error_message(status, body),
    }
}

/// Pull a human readable message out of an error body.
fn error_message(status: u16, body: &[u8]) -> String {
    let parsed: Option<ErrorResponse> = serde_json::from_slice(body).ok();
    parsed
        .and_then(|err| err.message.or(err.error).or(err.detail))
        .unwrap_or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown error")
                .to_string()
        })
}

#[derive(serde::Deserialize)]
struct ErrorResponse {
    message: Option<String>,
    error: Option<String>,
    detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_only_for_resource_lookups() {
        let err = classify_status(404, b"", Some("Product not found: 1"));
        assert_eq!(err, Error::NotFound("Product not found: 1".into()));
        assert!(err.is_not_found());

        let err = classify_status(404, b"", None);
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_message_from_body() {
        let err = classify_status(400, br#"{"message":"bad group"}"#, None);
        assert_eq!(
            err,
            Error::Api {
                status: 400,
                message: "bad group".into()
            }
        );

        let err = classify_status(503, b"<html>", None);
        assert_eq!(
            err,
            Error::Api {
                status: 503,
                message: "Service Unavailable".into()
            }
        );
    }

    #[test]
    fn test_local_failure_status() {
        let err = Error::local("boom").context("fetch products");
        assert_eq!(err.status(), Some(LOCAL_FAILURE_STATUS));
        assert_eq!(err.to_string(), "API error (500): Failed to fetch products: boom");
        assert_eq!(Error::Config("x".into()).status(), None);
    }
}
