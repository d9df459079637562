//! Site patterns for the VIER/VIJF/ZES listing and detail pages.

use std::sync::LazyLock;

use super::NamedPattern;

/// Compiles a pattern at static init; panics on invalid pattern.
fn compile_static_pattern(pattern: &str) -> NamedPattern {
    NamedPattern::new(pattern).unwrap_or_else(|e| panic!("invalid static pattern '{pattern}': {e}"))
}

/// Program links on the main program overview (`url`, `title`).
pub static EPISODE_PATTERN: LazyLock<NamedPattern> = LazyLock::new(|| {
    compile_static_pattern(
        r#"<a class="program-overview__link" href="(?<url>[^"]+)">(?<title>[^<]+)</a>"#,
    )
});

/// Video cards (`url`, `title`, optional `thumburl`, `thumburl2`, `timestamp`).
pub static VIDEO_PATTERN: LazyLock<NamedPattern> = LazyLock::new(|| {
    compile_static_pattern(concat!(
        r#"<a(?:[^>]+data-background-image="(?<thumburl>[^"]+)")?[^>]+href=""#,
        r#"(?<url>/video/[^"]+)"[^>]*>(?:\s+<div[^>]+>\s+<div [^>]+"#,
        r#"data-background-image="(?<thumburl2>[^"]+)")?(?s:.){0,1000}?"#,
        r#"<h3[^>]*>(?:<span>)?(?<title>[^<]+)(?:</span>)?</h3>(?:\s+"#,
        r#"(?:<div[^>]*>\s+)?<div[^>]*>[^<]+</div>\s+<div[^>]+data-timestamp="#,
        r#""(?<timestamp>\d+)")?"#,
    ))
});

/// "Load more" button (`url` = continuation path, `title` = current page number).
pub static PAGE_PATTERN: LazyLock<NamedPattern> = LazyLock::new(|| {
    compile_static_pattern(concat!(
        r#"<button class="button button--default js-load-more-button"\W+data-url="#,
        r#""(?<url>[^"]+)"\W+data-page="(?<title>\d+)""#,
    ))
});

/// Content locator embedded in a video detail page (`file`).
pub static DATA_FILE_PATTERN: LazyLock<NamedPattern> =
    LazyLock::new(|| compile_static_pattern(r#"data-file="(?<file>[^"]+)"#));
