//! Converts raw extracted field-sets into typed catalog entries.

use tracing::{debug, trace};

use crate::config::ChannelConfig;
use crate::extract::FieldSet;

use super::{CatalogEntry, EntryMeta, EpisodeEntry, PageCursor, VideoEntry, unescape_entities};

/// Which pattern produced a field-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSetKind {
    /// Program link from the main overview.
    Episode,
    /// Video card.
    Video,
    /// "Load more" continuation.
    Page,
}

/// Builds catalog entries with the channel's normalization rules.
///
/// Every episode and video on these sites is assumed geo restricted until the
/// stream resolver learns otherwise, so both start with `is_geo_locked = true`.
#[derive(Debug, Clone)]
pub struct EntryClassifier {
    no_image: String,
}

impl EntryClassifier {
    /// Creates a classifier using `no_image` as the placeholder thumbnail.
    #[must_use]
    pub fn new(no_image: impl Into<String>) -> Self {
        Self {
            no_image: no_image.into(),
        }
    }

    /// Creates a classifier for a channel.
    #[must_use]
    pub fn for_channel(channel: &ChannelConfig) -> Self {
        Self::new(channel.no_image.clone())
    }

    /// Returns the placeholder thumbnail name.
    #[must_use]
    pub fn no_image(&self) -> &str {
        &self.no_image
    }

    /// Classifies a field-set according to the pattern that produced it.
    ///
    /// Returns `None` for field-sets missing required fields.
    #[must_use]
    pub fn classify(&self, kind: FieldSetKind, fields: &FieldSet) -> Option<CatalogEntry> {
        let entry = match kind {
            FieldSetKind::Episode => self.episode(fields).map(CatalogEntry::Episode),
            FieldSetKind::Video => self.video(fields).map(CatalogEntry::Video),
            FieldSetKind::Page => self.page(fields).map(CatalogEntry::PageCursor),
        };
        if entry.is_none() {
            debug!(?kind, "Dropping incomplete field-set");
        }
        entry
    }

    /// Builds an episode entry; the thumbnail defaults to the placeholder image.
    #[must_use]
    pub fn episode(&self, fields: &FieldSet) -> Option<EpisodeEntry> {
        let mut meta = base_meta(fields)?;
        meta.is_geo_locked = true;
        meta.thumbnail = Some(
            non_empty(fields, "thumburl").map_or_else(|| self.no_image.clone(), str::to_string),
        );
        Some(EpisodeEntry { meta })
    }

    /// Builds a video entry with date and thumbnail normalization.
    #[must_use]
    pub fn video(&self, fields: &FieldSet) -> Option<VideoEntry> {
        let mut meta = base_meta(fields)?;
        meta.is_geo_locked = true;
        meta.thumbnail = non_empty(fields, "thumburl")
            .or_else(|| non_empty(fields, "thumburl2"))
            .map(|thumb| {
                if thumb == self.no_image {
                    thumb.to_string()
                } else {
                    unescape_entities(thumb)
                }
            });

        let mut video = VideoEntry::new(meta);
        if let Some(raw) = non_empty(fields, "timestamp") {
            let converted = raw
                .parse::<i64>()
                .is_ok_and(|epoch| video.set_timestamp(epoch));
            if !converted {
                trace!(timestamp = raw, "Ignoring unusable timestamp");
            }
        }
        Some(video)
    }

    /// Builds a page cursor from a continuation path and the current page number.
    #[must_use]
    pub fn page(&self, fields: &FieldSet) -> Option<PageCursor> {
        let url = non_empty(fields, "url")?;
        let page = non_empty(fields, "title")?.parse::<u32>().ok()?;
        Some(PageCursor::new(url, page))
    }
}

fn base_meta(fields: &FieldSet) -> Option<EntryMeta> {
    let url = non_empty(fields, "url")?;
    let title = unescape_entities(non_empty(fields, "title")?);
    Some(EntryMeta::new(title, url))
}

fn non_empty<'a>(fields: &'a FieldSet, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}
