//! Vier Core Library
//!
//! This library discovers the episodic video catalog of the VIER, VIJF and ZES
//! broadcaster sites, walks their paginated listings and resolves individual
//! videos into playable HLS stream variants, logging in transparently when the
//! content is access-restricted.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`transport`] - HTTP transport seam and the `reqwest`-backed client
//! - [`extract`] - Named-capture pattern extraction over listing pages
//! - [`catalog`] - Typed catalog entries and the entry classifier
//! - [`listing`] - Pagination-aware listing walker
//! - [`auth`] - Token lifecycle, identity provider client and credential vault
//! - [`stream`] - Stream resolver and HLS manifest parsing
//! - [`config`] - Channel constants and file-backed settings
//! - [`pipeline`] - Wiring of the components above for one run

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod extract;
pub mod listing;
pub mod pipeline;
pub mod stream;
pub mod transport;
pub(crate) mod user_agent;
#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use auth::{
    AuthError, AuthSession, CognitoIdentityClient, CredentialStore, EncryptedVault,
    IdentityProvider, LogNotifier, MemoryCredentialStore, Notice, Notifier, StoreError,
    TokenManager,
};
pub use catalog::{
    CatalogEntry, EntryClassifier, EntryMeta, EpisodeEntry, FieldSetKind, PageCursor,
    ResolvedMedia, StreamVariant, VideoEntry,
};
pub use config::{Channel, ChannelConfig, ConfigError, FileConfig, Settings};
pub use extract::{FieldSet, NamedPattern, PatternExtractor, RegexExtractor};
pub use listing::{ListingError, ListingPage, ListingWalker};
pub use pipeline::Pipeline;
pub use stream::{
    Locator, M3u8ManifestParser, ManifestParser, ManifestStream, ResolveError, StreamResolver,
};
pub use transport::{HttpTransport, ProxyConfig, Transport, TransportError, TransportOptions};
