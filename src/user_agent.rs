//! Shared User-Agent string for catalog, API and identity-provider traffic.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/vier";

/// Default User-Agent for all requests (single shared format).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("vier/{version} (catalog-browser; +{PROJECT_UA_URL})")
}
