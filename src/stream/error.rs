//! Error types for stream resolution.

use thiserror::Error;

use crate::auth::AuthError;
use crate::transport::TransportError;

/// Errors from resolving a video into stream variants.
///
/// A failed resolution leaves the video entry unchanged; callers may retry.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The detail page carries no `data-file` attribute.
    #[error("no content locator found on {url}")]
    NoLocatorFound {
        /// Detail page URL.
        url: String,
    },

    /// The content is restricted and authentication failed.
    #[error("authentication required: {0}")]
    AuthRequired(#[from] AuthError),

    /// A page, lookup or manifest fetch failed.
    #[error(transparent)]
    TransportFailure(#[from] TransportError),

    /// The content lookup did not name a manifest.
    #[error("content lookup for '{content_id}' returned no video manifest")]
    ManifestEmpty {
        /// Content identifier that was looked up.
        content_id: String,
    },

    /// The content lookup body was not the expected JSON document.
    #[error("content lookup for '{content_id}' returned an unreadable response: {reason}")]
    InvalidLookupResponse {
        /// Content identifier that was looked up.
        content_id: String,
        /// Parse failure description.
        reason: String,
    },
}

impl ResolveError {
    /// Creates a `NoLocatorFound` error.
    #[must_use]
    pub fn no_locator_found(url: &str) -> Self {
        Self::NoLocatorFound {
            url: url.to_string(),
        }
    }

    /// Creates a `ManifestEmpty` error.
    #[must_use]
    pub fn manifest_empty(content_id: &str) -> Self {
        Self::ManifestEmpty {
            content_id: content_id.to_string(),
        }
    }

    /// Creates an `InvalidLookupResponse` error.
    #[must_use]
    pub fn invalid_lookup_response(content_id: &str, reason: impl ToString) -> Self {
        Self::InvalidLookupResponse {
            content_id: content_id.to_string(),
            reason: reason.to_string(),
        }
    }
}
