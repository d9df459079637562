//! Wiring of transport, walker, token manager and resolver for one run.

use std::sync::Arc;

use tracing::debug;

use crate::auth::{
    AuthSession, CognitoIdentityClient, CredentialStore, IdentityProvider, TokenManager,
};
use crate::catalog::{EntryMeta, VideoEntry};
use crate::config::Settings;
use crate::extract::RegexExtractor;
use crate::listing::{ListingError, ListingPage, ListingWalker};
use crate::stream::{M3u8ManifestParser, ResolveError, StreamResolver};
use crate::transport::{HttpTransport, TransportError};

/// All components of one run, sharing a single HTTP client and auth session.
#[derive(Debug, Clone)]
pub struct Pipeline {
    settings: Settings,
    walker: ListingWalker,
    resolver: StreamResolver,
}

impl Pipeline {
    /// Builds the production pipeline from settings and a credential store.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] when the HTTP client cannot be
    /// constructed (for example an unusable proxy URL).
    pub fn from_settings(
        settings: Settings,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, TransportError> {
        let http = HttpTransport::with_options(&settings.transport_options())?;
        let identity = CognitoIdentityClient::new(
            http.client().clone(),
            settings.user_pool_id.clone(),
            settings.client_id.clone(),
        );
        Ok(Self::with_identity(
            settings,
            Arc::new(http),
            Arc::new(identity),
            credentials,
        ))
    }

    /// Builds a pipeline around an existing transport and identity provider.
    #[must_use]
    pub fn with_identity(
        settings: Settings,
        transport: Arc<HttpTransport>,
        identity: Arc<dyn IdentityProvider>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let channel = settings.channel_config();
        let tokens = TokenManager::new(Arc::new(AuthSession::new()), identity, credentials);
        let manifests = Arc::new(M3u8ManifestParser::new(transport.clone()));
        let resolver = StreamResolver::new(
            transport.clone(),
            manifests,
            tokens,
            channel.base_url.clone(),
        )
        .with_content_api_base(settings.content_api_base.clone());
        let walker = ListingWalker::new(transport, Arc::new(RegexExtractor), channel);
        debug!(channel = %settings.channel, "pipeline ready");

        Self {
            settings,
            walker,
            resolver,
        }
    }

    /// Returns the effective settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the listing walker.
    #[must_use]
    pub fn walker(&self) -> &ListingWalker {
        &self.walker
    }

    /// Returns the stream resolver.
    #[must_use]
    pub fn resolver(&self) -> &StreamResolver {
        &self.resolver
    }

    /// Returns the token manager shared by all resolutions.
    #[must_use]
    pub fn tokens(&self) -> &TokenManager {
        self.resolver.tokens()
    }

    /// Walks a listing from `start_url` (the main list when `None`).
    ///
    /// # Errors
    ///
    /// Returns the first [`ListingError`] encountered.
    pub async fn list(
        &self,
        start_url: Option<&str>,
        max_pages: Option<u32>,
    ) -> Result<Vec<ListingPage>, ListingError> {
        let start = start_url.unwrap_or(&self.walker.channel().main_list_url);
        let max_pages = max_pages.unwrap_or(self.settings.max_pages);
        self.walker.walk(start, max_pages).await
    }

    /// Resolves a video detail page URL into an entry with attached media.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when resolution fails.
    pub async fn resolve_url(&self, url: &str) -> Result<VideoEntry, ResolveError> {
        let title = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(url)
            .to_string();
        let mut meta = EntryMeta::new(title, url);
        meta.is_geo_locked = true;
        let mut video = VideoEntry::new(meta);
        self.resolver.update_video(&mut video).await?;
        Ok(video)
    }
}
