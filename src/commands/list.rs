//! `vier list`: walk a listing and print its entries.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use vier_core::{CatalogEntry, ListingPage, MemoryCredentialStore, Pipeline, Settings};

pub async fn run_list_command(
    settings: Settings,
    url: Option<&str>,
    pages: Option<u32>,
) -> Result<()> {
    // Listing never authenticates, so the vault is not opened here.
    let pipeline = Pipeline::from_settings(settings, Arc::new(MemoryCredentialStore::new()))
        .context("Failed to set up HTTP client")?;

    let fetched = pipeline
        .list(url, pages)
        .await
        .context("Failed to fetch listing")?;

    let mut shown = 0_usize;
    for page in &fetched {
        for line in render_page(page) {
            println!("{line}");
            shown += 1;
        }
    }
    info!(pages = fetched.len(), entries = shown, "Listing complete");
    Ok(())
}

/// Renders one tab-separated line per entry: kind, title, url and extras.
fn render_page(page: &ListingPage) -> Vec<String> {
    page.entries
        .iter()
        .map(|entry| {
            let meta = entry.meta();
            let extra = match entry {
                CatalogEntry::Video(video) => video
                    .timestamp()
                    .map(|date| date.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
                CatalogEntry::PageCursor(cursor) => format!("page {}", cursor.page_number()),
                CatalogEntry::Episode(_) => String::new(),
            };
            format!("{}\t{}\t{}\t{}", entry.kind(), meta.title, meta.url(), extra)
                .trim_end()
                .to_string()
        })
        .collect()
}
