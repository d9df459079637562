//! Pagination-aware listing walker.
//!
//! Three page shapes exist on the channel sites:
//!
//! - the program overview (main list), which only carries program links;
//! - program pages, which carry video cards and possibly a "load more" button;
//! - API paging documents under `/api/program/fixed/`, a JSON envelope whose
//!   `data` field holds more video cards and whose `loadMore` flag says
//!   whether another page follows.

mod error;

pub use error::ListingError;

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::catalog::{
    CatalogEntry, EntryClassifier, EpisodeEntry, FieldSetKind, PageCursor, VideoEntry,
};
use crate::config::ChannelConfig;
use crate::extract::patterns::{EPISODE_PATTERN, PAGE_PATTERN, VIDEO_PATTERN};
use crate::extract::{NamedPattern, PatternExtractor};
use crate::transport::{Transport, absolutize_url};

/// URL marker of JSON-backed continuation pages.
pub const API_PAGING_MARKER: &str = "/api/program/fixed/";

/// Entries extracted from one fetched listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Absolute URL that was fetched.
    pub url: String,
    /// Entries in extraction order.
    pub entries: Vec<CatalogEntry>,
}

impl ListingPage {
    /// Returns the program entries.
    pub fn episodes(&self) -> impl Iterator<Item = &EpisodeEntry> {
        self.entries.iter().filter_map(|entry| match entry {
            CatalogEntry::Episode(episode) => Some(episode),
            _ => None,
        })
    }

    /// Returns the video entries.
    pub fn videos(&self) -> impl Iterator<Item = &VideoEntry> {
        self.entries.iter().filter_map(|entry| match entry {
            CatalogEntry::Video(video) => Some(video),
            _ => None,
        })
    }

    /// Returns the continuation cursor, if the page has one.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&PageCursor> {
        self.entries.iter().find_map(|entry| match entry {
            CatalogEntry::PageCursor(cursor) => Some(cursor),
            _ => None,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPage {
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    load_more: bool,
}

/// Fetches listing pages and turns them into catalog entries.
#[derive(Clone)]
pub struct ListingWalker {
    transport: Arc<dyn Transport>,
    extractor: Arc<dyn PatternExtractor>,
    channel: ChannelConfig,
    classifier: EntryClassifier,
}

impl std::fmt::Debug for ListingWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingWalker")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

impl ListingWalker {
    /// Creates a walker for `channel`.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        extractor: Arc<dyn PatternExtractor>,
        channel: ChannelConfig,
    ) -> Self {
        let classifier = EntryClassifier::for_channel(&channel);
        Self {
            transport,
            extractor,
            channel,
            classifier,
        }
    }

    /// Returns the classifier applied to extracted field-sets.
    #[must_use]
    pub fn classifier(&self) -> &EntryClassifier {
        &self.classifier
    }

    /// Returns the channel constants.
    #[must_use]
    pub fn channel(&self) -> &ChannelConfig {
        &self.channel
    }

    /// Fetches the program overview.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError`] when the page cannot be fetched.
    pub async fn fetch_main_list(&self) -> Result<ListingPage, ListingError> {
        self.fetch(&self.channel.main_list_url, None).await
    }

    /// Fetches `url`; `parent` is the cursor whose selection led here.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError`] when the page cannot be fetched or an API
    /// paging payload is malformed.
    #[tracing::instrument(skip(self, parent), fields(page = parent.map(PageCursor::page_number)))]
    pub async fn fetch(
        &self,
        url: &str,
        parent: Option<&PageCursor>,
    ) -> Result<ListingPage, ListingError> {
        let absolute = absolutize_url(url, &self.channel.base_url);
        let body = self.transport.get(&absolute, &[]).await?;
        let page = self.parse(&absolute, &body, parent)?;
        info!(
            entries = page.entries.len(),
            has_more = page.next_cursor().is_some(),
            "fetched listing page"
        );
        Ok(page)
    }

    /// Re-enters the walker with a cursor's URL.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch`].
    pub async fn select(&self, cursor: &PageCursor) -> Result<ListingPage, ListingError> {
        self.fetch(cursor.next_url(), Some(cursor)).await
    }

    /// Extracts entries from an already fetched page body.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::InvalidPayload`] when `url` is an API paging
    /// URL and `body` is not its JSON envelope.
    pub fn parse(
        &self,
        url: &str,
        body: &str,
        parent: Option<&PageCursor>,
    ) -> Result<ListingPage, ListingError> {
        let mut entries = Vec::new();

        if url.contains(API_PAGING_MARKER) {
            let api: ApiPage = serde_json::from_str(body)
                .map_err(|error| ListingError::invalid_payload(url, error))?;
            if api.load_more {
                // Without a parent the requested URL carries the page number itself.
                let requested = parent.map_or(url, PageCursor::next_url);
                match PageCursor::following(requested) {
                    Some(cursor) => entries.push(CatalogEntry::PageCursor(cursor)),
                    None => warn!(requested, "cannot derive next page from URL"),
                }
            }
            let fragment = api.data.unwrap_or_default();
            self.collect(&mut entries, &fragment, &VIDEO_PATTERN, FieldSetKind::Video);
        } else if self.is_main_list(url) {
            self.collect(&mut entries, body, &EPISODE_PATTERN, FieldSetKind::Episode);
        } else {
            self.collect(&mut entries, body, &VIDEO_PATTERN, FieldSetKind::Video);
            self.collect(&mut entries, body, &PAGE_PATTERN, FieldSetKind::Page);
        }

        Ok(ListingPage {
            url: url.to_string(),
            entries,
        })
    }

    /// Fetches `start_url` and follows continuation cursors.
    ///
    /// Stops when a page has no cursor, when a cursor would not advance the
    /// page number, or after `max_pages` fetches (at least one).
    ///
    /// # Errors
    ///
    /// Returns the first [`ListingError`]; pages fetched before it are discarded.
    pub async fn walk(
        &self,
        start_url: &str,
        max_pages: u32,
    ) -> Result<Vec<ListingPage>, ListingError> {
        let limit = usize::try_from(max_pages.max(1)).unwrap_or(usize::MAX);
        let mut pages = vec![self.fetch(start_url, None).await?];
        let mut last_page_number: Option<u32> = None;

        while pages.len() < limit {
            let Some(cursor) = pages.last().and_then(ListingPage::next_cursor).cloned() else {
                break;
            };
            if last_page_number.is_some_and(|last| cursor.page_number() <= last) {
                warn!(
                    page = cursor.page_number(),
                    "continuation does not advance, stopping"
                );
                break;
            }
            last_page_number = Some(cursor.page_number());
            pages.push(self.select(&cursor).await?);
        }

        debug!(pages = pages.len(), "listing walk finished");
        Ok(pages)
    }

    fn collect(
        &self,
        entries: &mut Vec<CatalogEntry>,
        text: &str,
        pattern: &NamedPattern,
        kind: FieldSetKind,
    ) {
        entries.extend(
            self.extractor
                .extract(text, pattern)
                .iter()
                .filter_map(|fields| self.classifier.classify(kind, fields)),
        );
    }

    fn is_main_list(&self, url: &str) -> bool {
        url.trim_end_matches('/') == self.channel.main_list_url.trim_end_matches('/')
    }
}
