//! Stream resolution: video detail page to ranked playable variants.
//!
//! - [`StreamResolver`] - Detail page → locator → manifest → filtered variants
//! - [`Locator`] - What a detail page points at
//! - [`ManifestParser`] / [`M3u8ManifestParser`] - HLS master playlist variants

mod error;
mod manifest;

pub use error::ResolveError;
pub use manifest::{M3u8ManifestParser, ManifestParser, ManifestStream, parse_master_playlist};

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::auth::TokenManager;
use crate::catalog::{ResolvedMedia, StreamVariant, VideoEntry};
use crate::extract::patterns::DATA_FILE_PATTERN;
use crate::transport::{Transport, absolutize_url};

/// Base of the restricted content lookup API.
pub const DEFAULT_CONTENT_API_BASE: &str = "https://api.viervijfzes.be/content";

/// The content reference embedded in a video detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A manifest URL usable as-is.
    DirectManifest(String),
    /// An opaque id that must be exchanged for a manifest through the content API.
    ContentId(String),
}

impl Locator {
    /// Classifies a raw `data-file` value.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.contains(".m3u8") {
            Self::DirectManifest(raw.to_string())
        } else {
            Self::ContentId(raw.to_string())
        }
    }

    /// Returns the locator of the last `data-file` attribute on a detail page.
    #[must_use]
    pub fn from_page(html: &str) -> Option<Self> {
        DATA_FILE_PATTERN
            .last_value(html, "file")
            .filter(|value| !value.trim().is_empty())
            .map(|value| Self::classify(&value))
    }
}

#[derive(Debug, Deserialize)]
struct ContentLookup {
    video: Option<VideoField>,
}

/// The content API wraps the manifest URL in a typed string attribute
/// (`{"S": "<url>"}`); a bare string is accepted as well.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VideoField {
    Plain(String),
    Typed {
        #[serde(rename = "S")]
        s: String,
    },
}

impl VideoField {
    fn into_url(self) -> String {
        match self {
            Self::Plain(url) | Self::Typed { s: url } => url,
        }
    }
}

/// Resolves video entries into playable stream variants.
#[derive(Clone)]
pub struct StreamResolver {
    transport: Arc<dyn Transport>,
    manifests: Arc<dyn ManifestParser>,
    tokens: TokenManager,
    base_url: String,
    content_api_base: String,
}

impl std::fmt::Debug for StreamResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResolver")
            .field("base_url", &self.base_url)
            .field("content_api_base", &self.content_api_base)
            .finish_non_exhaustive()
    }
}

impl StreamResolver {
    /// Creates a resolver for the site at `base_url`.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        manifests: Arc<dyn ManifestParser>,
        tokens: TokenManager,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            manifests,
            tokens,
            base_url: base_url.into(),
            content_api_base: DEFAULT_CONTENT_API_BASE.to_string(),
        }
    }

    /// Overrides the content lookup API base.
    #[must_use]
    pub fn with_content_api_base(mut self, content_api_base: impl Into<String>) -> Self {
        self.content_api_base = content_api_base.into();
        self
    }

    /// Returns the token manager used for restricted lookups.
    #[must_use]
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Resolves `video` without modifying it.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NoLocatorFound`] when the detail page has no `data-file`
    /// - [`ResolveError::AuthRequired`] when a restricted lookup cannot authenticate
    /// - [`ResolveError::ManifestEmpty`] / [`ResolveError::InvalidLookupResponse`]
    ///   when the lookup does not name a manifest
    /// - [`ResolveError::TransportFailure`] when any fetch fails
    #[tracing::instrument(skip_all, fields(url = %video.meta.url()))]
    pub async fn resolve(&self, video: &VideoEntry) -> Result<ResolvedMedia, ResolveError> {
        let page_url = absolutize_url(video.meta.url(), &self.base_url);
        let page = self.transport.get(&page_url, &[]).await?;
        let locator =
            Locator::from_page(&page).ok_or_else(|| ResolveError::no_locator_found(&page_url))?;
        debug!(?locator, "found content locator");

        let manifest_url = match locator {
            Locator::DirectManifest(url) => url,
            Locator::ContentId(id) => self.lookup_manifest(&id).await?,
        };

        let mut media = ResolvedMedia::new(video.meta.is_geo_locked);
        if manifest_url.to_ascii_lowercase().contains("geo") {
            media.mark_geo_locked();
        }

        for stream in self.manifests.streams_of(&manifest_url).await? {
            let Ok(bitrate_kbps) = stream.bitrate_kbps.trim().parse::<u32>() else {
                warn!(
                    locator = %stream.locator,
                    bitrate = %stream.bitrate_kbps,
                    "skipping stream with unparseable bitrate"
                );
                continue;
            };
            if !media.accept(StreamVariant::new(stream.locator.clone(), bitrate_kbps)) {
                debug!(locator = %stream.locator, bitrate_kbps, "dropping low-bitrate stream");
            }
        }

        // Complete even when nothing survived the bitrate filter.
        media.is_complete = true;
        info!(
            variants = media.variants().len(),
            geo_locked = media.is_geo_locked(),
            "resolved video"
        );
        Ok(media)
    }

    /// Resolves `video` and attaches the result; on error the entry is left as it was.
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve`].
    pub async fn update_video(&self, video: &mut VideoEntry) -> Result<(), ResolveError> {
        let media = self.resolve(video).await?;
        video.attach_media(media);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn lookup_manifest(&self, content_id: &str) -> Result<String, ResolveError> {
        let id_token = self.tokens.authorization().await?;
        let lookup_url = format!(
            "{}/{}",
            self.content_api_base.trim_end_matches('/'),
            urlencoding::encode(content_id)
        );
        let body = self
            .transport
            .get(
                &lookup_url,
                &[
                    ("authorization", id_token.as_str()),
                    ("content-type", "application/json"),
                ],
            )
            .await?;

        let lookup: ContentLookup = serde_json::from_str(&body)
            .map_err(|error| ResolveError::invalid_lookup_response(content_id, error))?;
        lookup
            .video
            .map(VideoField::into_url)
            .filter(|video| !video.trim().is_empty())
            .ok_or_else(|| ResolveError::manifest_empty(content_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::{
        AuthError, AuthSession, MemoryCredentialStore, PASSWORD_KEY, USERNAME_KEY,
    };
    use crate::catalog::EntryMeta;
    use crate::test_support::{FakeIdentity, FakeManifests, FakeTransport};

    const BASE: &str = "https://www.vier.be";
    const PAGE_URL: &str = "https://www.vier.be/video/de-mol/aflevering-1";
    const LOOKUP_URL: &str = "https://api.viervijfzes.be/content/abc123";
    const MANIFEST_URL: &str = "https://cdn/x.m3u8";

    fn video() -> VideoEntry {
        let mut meta = EntryMeta::new("Aflevering 1", "/video/de-mol/aflevering-1");
        meta.is_geo_locked = true;
        VideoEntry::new(meta)
    }

    fn detail_page(data_file: &str) -> String {
        format!(
            r#"<div class="video-player" data-file="ignored-first"></div>
               <div class="video-player" data-file="{data_file}"></div>"#
        )
    }

    struct Harness {
        transport: Arc<FakeTransport>,
        manifests: Arc<FakeManifests>,
        identity: Arc<FakeIdentity>,
        resolver: StreamResolver,
    }

    fn harness(transport: FakeTransport, manifests: FakeManifests, with_credentials: bool) -> Harness {
        let transport = Arc::new(transport);
        let manifests = Arc::new(manifests);
        let identity = Arc::new(FakeIdentity::accepting("id-token-1", "r-1"));
        let store = if with_credentials {
            MemoryCredentialStore::with_entries([(USERNAME_KEY, "alice"), (PASSWORD_KEY, "pw")])
        } else {
            MemoryCredentialStore::new()
        };
        let tokens = TokenManager::new(
            Arc::new(AuthSession::new()),
            identity.clone(),
            Arc::new(store),
        );
        let resolver = StreamResolver::new(transport.clone(), manifests.clone(), tokens, BASE);
        Harness {
            transport,
            manifests,
            identity,
            resolver,
        }
    }

    #[test]
    fn test_locator_classification() {
        assert_eq!(
            Locator::classify("https://cdn/x.m3u8?token=1"),
            Locator::DirectManifest("https://cdn/x.m3u8?token=1".to_string())
        );
        assert_eq!(
            Locator::classify("abc123"),
            Locator::ContentId("abc123".to_string())
        );
    }

    #[test]
    fn test_locator_from_page_takes_last_data_file() {
        assert_eq!(
            Locator::from_page(&detail_page("abc123")),
            Some(Locator::ContentId("abc123".to_string()))
        );
        assert_eq!(Locator::from_page("<div>no player</div>"), None);
    }

    #[tokio::test]
    async fn test_content_id_lookup_filters_low_bitrates() {
        let h = harness(
            FakeTransport::new()
                .with_page(PAGE_URL, &detail_page("abc123"))
                .with_page(LOOKUP_URL, r#"{"video": "https://cdn/x.m3u8"}"#),
            FakeManifests::default()
                .with_manifest(MANIFEST_URL, &[("urlA", "150"), ("urlB", "250")]),
            true,
        );

        let media = h.resolver.resolve(&video()).await.unwrap();

        assert_eq!(media.variants(), &[StreamVariant::new("urlB", 250)]);
        assert!(media.is_complete);
        assert!(media.is_geo_locked());

        let lookup = &h.transport.requests()[1];
        assert_eq!(lookup.url, LOOKUP_URL);
        assert_eq!(lookup.header("authorization"), Some("id-token-1"));
        assert_eq!(lookup.header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_lookup_accepts_typed_video_attribute() {
        let h = harness(
            FakeTransport::new()
                .with_page(PAGE_URL, &detail_page("abc123"))
                .with_page(LOOKUP_URL, r#"{"video": {"S": "https://cdn/x.m3u8"}}"#),
            FakeManifests::default()
                .with_manifest(MANIFEST_URL, &[("urlA", "150"), ("urlB", "250")]),
            true,
        );

        let media = h.resolver.resolve(&video()).await.unwrap();

        assert_eq!(media.variants(), &[StreamVariant::new("urlB", 250)]);
        assert_eq!(h.manifests.requests(), vec![MANIFEST_URL.to_string()]);
    }

    #[tokio::test]
    async fn test_lookup_with_unexpected_video_shape_is_invalid() {
        let h = harness(
            FakeTransport::new()
                .with_page(PAGE_URL, &detail_page("abc123"))
                .with_page(LOOKUP_URL, r#"{"video": {"N": "42"}}"#),
            FakeManifests::default(),
            true,
        );

        let err = h.resolver.resolve(&video()).await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidLookupResponse { .. }));
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive_and_unparseable_bitrates_are_skipped() {
        let h = harness(
            FakeTransport::new().with_page(PAGE_URL, &detail_page(MANIFEST_URL)),
            FakeManifests::default().with_manifest(
                MANIFEST_URL,
                &[("low", "199"), ("edge", "200"), ("broken", "n/a"), ("hd", "3000")],
            ),
            false,
        );

        let media = h.resolver.resolve(&video()).await.unwrap();
        let kept = media
            .variants()
            .iter()
            .map(|variant| variant.locator.as_str())
            .collect::<Vec<_>>();
        assert_eq!(kept, vec!["edge", "hd"]);
        assert_eq!(media.best_variant().unwrap().locator, "hd");
    }

    #[tokio::test]
    async fn test_direct_manifest_skips_authentication() {
        let h = harness(
            FakeTransport::new().with_page(PAGE_URL, &detail_page(MANIFEST_URL)),
            FakeManifests::default().with_manifest(MANIFEST_URL, &[("hd", "2500")]),
            false,
        );

        let media = h.resolver.resolve(&video()).await.unwrap();
        assert_eq!(media.variants().len(), 1);
        assert_eq!(h.identity.authenticate_calls(), 0);
        assert_eq!(h.transport.requested_urls(), vec![PAGE_URL.to_string()]);
        assert_eq!(h.manifests.requests(), vec![MANIFEST_URL.to_string()]);
    }

    #[tokio::test]
    async fn test_geo_in_manifest_url_marks_geo_locked() {
        let geo_manifest = "https://cdn/GEO/x.m3u8";
        let unlocked = VideoEntry::new(EntryMeta::new("t", "/video/de-mol/aflevering-1"));
        assert!(!unlocked.meta.is_geo_locked);

        let h = harness(
            FakeTransport::new().with_page(PAGE_URL, &detail_page(geo_manifest)),
            FakeManifests::default().with_manifest(geo_manifest, &[("hd", "2500")]),
            false,
        );

        let media = h.resolver.resolve(&unlocked).await.unwrap();
        assert!(media.is_geo_locked());
    }

    #[tokio::test]
    async fn test_zero_surviving_variants_is_still_complete() {
        let h = harness(
            FakeTransport::new().with_page(PAGE_URL, &detail_page(MANIFEST_URL)),
            FakeManifests::default().with_manifest(MANIFEST_URL, &[("low", "100")]),
            false,
        );

        let media = h.resolver.resolve(&video()).await.unwrap();
        assert!(media.variants().is_empty());
        assert!(media.is_complete);
    }

    #[tokio::test]
    async fn test_resolving_twice_yields_same_variants() {
        let h = harness(
            FakeTransport::new()
                .with_page(PAGE_URL, &detail_page("abc123"))
                .with_page(LOOKUP_URL, r#"{"video": "https://cdn/x.m3u8"}"#),
            FakeManifests::default()
                .with_manifest(MANIFEST_URL, &[("urlA", "150"), ("urlB", "250")]),
            true,
        );

        let first = h.resolver.resolve(&video()).await.unwrap();
        let second = h.resolver.resolve(&video()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(h.identity.authenticate_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_locator() {
        let h = harness(
            FakeTransport::new().with_page(PAGE_URL, "<html></html>"),
            FakeManifests::default(),
            true,
        );

        let err = h.resolver.resolve(&video()).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoLocatorFound { url } if url == PAGE_URL));
    }

    #[tokio::test]
    async fn test_missing_credentials_is_auth_required() {
        let h = harness(
            FakeTransport::new().with_page(PAGE_URL, &detail_page("abc123")),
            FakeManifests::default(),
            false,
        );

        let err = h.resolver.resolve(&video()).await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::AuthRequired(AuthError::MissingCredentials)
        ));
        assert_eq!(h.identity.authenticate_calls(), 0);
        assert_eq!(h.transport.requested_urls(), vec![PAGE_URL.to_string()]);
    }

    #[tokio::test]
    async fn test_lookup_without_video_is_manifest_empty() {
        let h = harness(
            FakeTransport::new()
                .with_page(PAGE_URL, &detail_page("abc123"))
                .with_page(LOOKUP_URL, r#"{"video": ""}"#),
            FakeManifests::default(),
            true,
        );

        let err = h.resolver.resolve(&video()).await.unwrap_err();
        assert!(matches!(err, ResolveError::ManifestEmpty { content_id } if content_id == "abc123"));
    }

    #[tokio::test]
    async fn test_lookup_non_json_is_invalid_response() {
        let h = harness(
            FakeTransport::new()
                .with_page(PAGE_URL, &detail_page("abc123"))
                .with_page(LOOKUP_URL, "<html>maintenance</html>"),
            FakeManifests::default(),
            true,
        );

        let err = h.resolver.resolve(&video()).await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidLookupResponse { .. }));
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_video_untouched() {
        let h = harness(
            FakeTransport::new().with_status(PAGE_URL, 503),
            FakeManifests::default(),
            true,
        );
        let mut entry = video();
        let before = entry.clone();

        let err = h.resolver.update_video(&mut entry).await.unwrap_err();
        assert!(matches!(err, ResolveError::TransportFailure(_)));
        assert_eq!(entry, before);
    }

    #[tokio::test]
    async fn test_update_video_attaches_media() {
        let h = harness(
            FakeTransport::new().with_page(PAGE_URL, &detail_page(MANIFEST_URL)),
            FakeManifests::default().with_manifest(MANIFEST_URL, &[("hd", "2500")]),
            false,
        );
        let mut entry = video();

        h.resolver.update_video(&mut entry).await.unwrap();
        assert!(entry.meta.is_complete);
        assert!(entry.meta.is_geo_locked);
        assert_eq!(entry.media().unwrap().variants().len(), 1);
    }
}
