//! HTTP transport used by the listing walker, stream resolver and manifest parser.
//!
//! - [`Transport`] - Async trait every fetch in the pipeline goes through
//! - [`HttpTransport`] - `reqwest`-backed implementation with shared timeout,
//!   user-agent and proxy policy
//!
//! The trait exists so the pipeline can be exercised against in-memory pages in
//! tests; production code always uses [`HttpTransport`].

mod error;
mod http;

pub use error::TransportError;
pub use http::{HttpTransport, ProxyConfig, TransportOptions, build_http_client};

use async_trait::async_trait;

/// Performs HTTP GET requests and returns the response body as text.
///
/// # Object Safety
///
/// This trait uses `async_trait` so components can hold an `Arc<dyn Transport>`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url` with the given extra request headers.
    ///
    /// Non-success HTTP statuses are reported as [`TransportError::HttpStatus`].
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, TransportError>;
}

/// Makes a site-relative or protocol-relative URL absolute against `base_url`.
///
/// Absolute URLs and values that cannot be joined are returned unchanged.
#[must_use]
pub fn absolutize_url(value: &str, base_url: &str) -> String {
    if value.starts_with("http://") || value.starts_with("https://") {
        return value.to_string();
    }
    if value.starts_with("//") {
        return format!("https:{value}");
    }
    url::Url::parse(base_url)
        .and_then(|base| base.join(value))
        .map_or_else(|_| value.to_string(), |joined| joined.to_string())
}
