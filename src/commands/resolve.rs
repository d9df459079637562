//! `vier resolve`: resolve one video page into stream variants.

use anyhow::{Context, Result};
use tracing::{info, warn};
use vier_core::{Pipeline, Settings};

use super::open_credential_store;

pub async fn run_resolve_command(settings: Settings, url: &str) -> Result<()> {
    let pipeline = Pipeline::from_settings(settings, open_credential_store())
        .context("Failed to set up HTTP client")?;

    let video = pipeline
        .resolve_url(url)
        .await
        .with_context(|| format!("Failed to resolve '{url}'"))?;

    let Some(media) = video.media() else {
        return Ok(());
    };
    if media.variants().is_empty() {
        warn!("No playable streams at or above the minimum bitrate");
    }
    for variant in media.variants() {
        println!("{}\t{}", variant.bitrate_kbps, variant.locator);
    }
    if let Some(best) = media.best_variant() {
        info!(
            bitrate_kbps = best.bitrate_kbps,
            geo_locked = media.is_geo_locked(),
            "Best stream: {}",
            best.locator
        );
    }
    Ok(())
}
