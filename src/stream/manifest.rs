//! HLS master playlist parsing.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::transport::{Transport, TransportError};

const STREAM_INF_TAG: &str = "#EXT-X-STREAM-INF:";

// Anchored on the attribute boundary so AVERAGE-BANDWIDTH is not picked up.
static BANDWIDTH_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|,)BANDWIDTH=(\d+)")
        .unwrap_or_else(|error| panic!("invalid BANDWIDTH regex: {error}"))
});

/// One variant stream as advertised by a manifest.
///
/// The bitrate is kept textual; callers decide what to do with values that
/// do not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestStream {
    /// Absolute stream URL.
    pub locator: String,
    /// Bitrate in kbps as text.
    pub bitrate_kbps: String,
}

impl ManifestStream {
    /// Creates a manifest stream.
    #[must_use]
    pub fn new(locator: impl Into<String>, bitrate_kbps: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            bitrate_kbps: bitrate_kbps.into(),
        }
    }
}

/// Lists the variant streams of a manifest URL.
#[async_trait]
pub trait ManifestParser: Send + Sync {
    /// Fetches `manifest_url` and returns its variants in manifest order.
    async fn streams_of(&self, manifest_url: &str) -> Result<Vec<ManifestStream>, TransportError>;
}

/// [`ManifestParser`] for HLS master playlists fetched over a [`Transport`].
#[derive(Clone)]
pub struct M3u8ManifestParser {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for M3u8ManifestParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("M3u8ManifestParser").finish_non_exhaustive()
    }
}

impl M3u8ManifestParser {
    /// Creates a parser fetching through `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ManifestParser for M3u8ManifestParser {
    #[tracing::instrument(skip(self))]
    async fn streams_of(&self, manifest_url: &str) -> Result<Vec<ManifestStream>, TransportError> {
        let body = self.transport.get(manifest_url, &[]).await?;
        let streams = parse_master_playlist(manifest_url, &body);
        debug!(count = streams.len(), "parsed master playlist");
        Ok(streams)
    }
}

/// Extracts `#EXT-X-STREAM-INF` variants from a master playlist body.
///
/// `BANDWIDTH` (bits/s) is reported in kbps. A missing bandwidth yields an
/// empty bitrate. Relative URIs are resolved against `manifest_url`.
#[must_use]
pub fn parse_master_playlist(manifest_url: &str, body: &str) -> Vec<ManifestStream> {
    let base = Url::parse(manifest_url).ok();
    let mut streams = Vec::new();
    let mut pending: Option<String> = None;

    for line in body.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        if let Some(attributes) = line.strip_prefix(STREAM_INF_TAG) {
            pending = Some(bitrate_of(attributes));
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        if let Some(bitrate) = pending.take() {
            let locator = base
                .as_ref()
                .and_then(|base| base.join(line).ok())
                .map_or_else(|| line.to_string(), |joined| joined.to_string());
            streams.push(ManifestStream::new(locator, bitrate));
        }
    }

    streams
}

fn bitrate_of(attributes: &str) -> String {
    BANDWIDTH_ATTR
        .captures(attributes)
        .and_then(|caps| caps.get(1))
        .and_then(|bandwidth| bandwidth.as_str().parse::<u64>().ok())
        .map(|bps| (bps / 1000).to_string())
        .unwrap_or_default()
}
