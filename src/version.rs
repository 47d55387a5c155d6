//! SDK version information and API version tagging.

/// Current SDK version.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version tag meaning "whatever the registry currently serves".
pub const LATEST_API_VERSION: &str = "latest";

/// Header carrying a pinned API version.
pub const API_VERSION_HEADER: &str = "x-api-version";

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// The API version to pin, or `None` for the latest one.
///
/// Blank tags are treated as latest.
pub fn pinned_api_version(version: &str) -> Option<&str> {
    let version = version.trim();
    if version.is_empty() || version.eq_ignore_ascii_case(LATEST_API_VERSION) {
        None
    } else {
        Some(version)
    }
}

/// Build the User-Agent string for SDK requests.
pub fn build_user_agent(suffix: Option<&str>) -> String {
    let mut ua = format!(
        "Eprel-SDK-Rust/{} ({}; {})",
        SDK_VERSION,
        std::env::consts::OS,
        std::env::consts::ARCH
    );

    if let Some(s) = suffix {
        ua.push(' ');
        ua.push_str(s);
    }

    ua
}
