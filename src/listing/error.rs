//! Error types for listing retrieval.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors from fetching or parsing a listing page.
#[derive(Debug, Error)]
pub enum ListingError {
    /// The page could not be fetched.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An API paging response was not the expected JSON document.
    #[error("unexpected listing payload from {url}: {reason}")]
    InvalidPayload {
        /// Requested URL.
        url: String,
        /// Parse failure description.
        reason: String,
    },
}

impl ListingError {
    /// Creates an `InvalidPayload` error.
    #[must_use]
    pub fn invalid_payload(url: &str, reason: impl ToString) -> Self {
        Self::InvalidPayload {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
