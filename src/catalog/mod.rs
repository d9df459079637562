//! Typed catalog entries produced from listing pages.
//!
//! - [`CatalogEntry`] - Tagged union over episodes, page cursors and videos
//! - [`EntryClassifier`] - Turns raw field-sets into typed entries
//! - [`ResolvedMedia`] - Playable stream variants attached to a video

mod classifier;
mod html;

pub use classifier::{EntryClassifier, FieldSetKind};
pub use html::unescape_entities;

use chrono::{DateTime, Utc};

/// Variants below this bitrate are placeholder streams and never playable.
pub const MIN_PLAYABLE_BITRATE_KBPS: u32 = 200;

/// Fields shared by every catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    /// Display title.
    pub title: String,
    url: String,
    /// Thumbnail URL or placeholder image name.
    pub thumbnail: Option<String>,
    /// Whether the content is restricted to specific regions.
    pub is_geo_locked: bool,
    /// Whether the entry is fully resolved.
    pub is_complete: bool,
}

impl EntryMeta {
    /// Creates metadata with no thumbnail, not geo locked and not complete.
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            thumbnail: None,
            is_geo_locked: false,
            is_complete: false,
        }
    }

    /// Returns the entry URL (absolute or site-relative). Fixed at creation.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// A program folder from the main program overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeEntry {
    /// Common entry fields.
    pub meta: EntryMeta,
}

/// A "next page" entry of a paginated listing.
///
/// The cursor URL ends with the page number it requests; its title is one
/// ahead of that number, which is how the site numbers its pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    /// Common entry fields.
    pub meta: EntryMeta,
    page_number: u32,
}

impl PageCursor {
    /// Creates a cursor requesting `<continuation_url>/<page_number>`.
    #[must_use]
    pub fn new(continuation_url: &str, page_number: u32) -> Self {
        let url = format!("{}/{page_number}", continuation_url.trim_end_matches('/'));
        let title = (u64::from(page_number) + 1).to_string();
        Self {
            meta: EntryMeta::new(title, url),
            page_number,
        }
    }

    /// Derives the cursor that follows a page requested through `requested_url`.
    ///
    /// `requested_url` must end in `/<page>`; the result requests `page + 1`.
    #[must_use]
    pub fn following(requested_url: &str) -> Option<Self> {
        let (prefix, page) = requested_url.rsplit_once('/')?;
        let page = page.trim().parse::<u32>().ok()?;
        Some(Self::new(prefix, page.checked_add(1)?))
    }

    /// Returns the page number encoded in the cursor URL.
    #[must_use]
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Returns the URL to fetch when this cursor is selected.
    #[must_use]
    pub fn next_url(&self) -> &str {
        self.meta.url()
    }
}

/// A playable video stub; streams are attached lazily by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEntry {
    /// Common entry fields.
    pub meta: EntryMeta,
    timestamp: Option<DateTime<Utc>>,
    media: Option<ResolvedMedia>,
}

impl VideoEntry {
    /// Creates a video entry with the given metadata.
    #[must_use]
    pub fn new(meta: EntryMeta) -> Self {
        Self {
            meta,
            timestamp: None,
            media: None,
        }
    }

    /// Sets the broadcast date from a Unix epoch in seconds.
    ///
    /// Returns `false` (leaving the date unchanged) when the epoch is out of range.
    pub fn set_timestamp(&mut self, epoch_secs: i64) -> bool {
        match DateTime::from_timestamp(epoch_secs, 0) {
            Some(date_time) => {
                self.timestamp = Some(date_time);
                true
            }
            None => false,
        }
    }

    /// Returns the broadcast date, if known.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Returns the attached media, if the video was resolved.
    #[must_use]
    pub fn media(&self) -> Option<&ResolvedMedia> {
        self.media.as_ref()
    }

    /// Attaches resolved media, upgrading (never clearing) the geo lock.
    pub fn attach_media(&mut self, media: ResolvedMedia) {
        self.meta.is_geo_locked |= media.is_geo_locked();
        self.meta.is_complete = media.is_complete;
        self.media = Some(media);
    }
}

/// A typed catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEntry {
    /// Program folder.
    Episode(EpisodeEntry),
    /// Next-page cursor.
    PageCursor(PageCursor),
    /// Video stub.
    Video(VideoEntry),
}

impl CatalogEntry {
    /// Returns the common entry fields.
    #[must_use]
    pub fn meta(&self) -> &EntryMeta {
        match self {
            Self::Episode(entry) => &entry.meta,
            Self::PageCursor(entry) => &entry.meta,
            Self::Video(entry) => &entry.meta,
        }
    }

    /// Returns a short label for the entry kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Episode(_) => "episode",
            Self::PageCursor(_) => "page",
            Self::Video(_) => "video",
        }
    }
}

/// One playable stream of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamVariant {
    /// Stream URL.
    pub locator: String,
    /// Advertised bitrate in kbps.
    pub bitrate_kbps: u32,
}

impl StreamVariant {
    /// Creates a stream variant.
    #[must_use]
    pub fn new(locator: impl Into<String>, bitrate_kbps: u32) -> Self {
        Self {
            locator: locator.into(),
            bitrate_kbps,
        }
    }

    /// Returns true if the variant is at or above the playable threshold.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        self.bitrate_kbps >= MIN_PLAYABLE_BITRATE_KBPS
    }
}

/// Result of resolving a video: playable variants in manifest order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    variants: Vec<StreamVariant>,
    /// Whether resolution finished.
    pub is_complete: bool,
    is_geo_locked: bool,
}

impl ResolvedMedia {
    /// Creates an empty result starting from the video's geo flag.
    #[must_use]
    pub fn new(is_geo_locked: bool) -> Self {
        Self {
            variants: Vec::new(),
            is_complete: false,
            is_geo_locked,
        }
    }

    /// Appends a variant if it is playable; returns whether it was kept.
    ///
    /// The first kept variant marks the result complete.
    pub fn accept(&mut self, variant: StreamVariant) -> bool {
        if !variant.is_playable() {
            return false;
        }
        self.is_complete = true;
        self.variants.push(variant);
        true
    }

    /// Marks the content as geo restricted. There is no way to clear it.
    pub fn mark_geo_locked(&mut self) {
        self.is_geo_locked = true;
    }

    /// Returns whether the content is geo restricted.
    #[must_use]
    pub fn is_geo_locked(&self) -> bool {
        self.is_geo_locked
    }

    /// Returns the kept variants in manifest order.
    #[must_use]
    pub fn variants(&self) -> &[StreamVariant] {
        &self.variants
    }

    /// Returns the highest-bitrate variant (first one wins on ties).
    #[must_use]
    pub fn best_variant(&self) -> Option<&StreamVariant> {
        self.variants
            .iter()
            .rev()
            .max_by_key(|variant| variant.bitrate_kbps)
    }
}
