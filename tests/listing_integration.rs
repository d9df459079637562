//! Integration tests for listing pagination over HTTP.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vier_core::{Channel, HttpTransport, ListingError, ListingWalker, RegexExtractor};
mod support;
use support::socket_guard::start_mock_server_or_skip;

fn walker(server: &MockServer) -> ListingWalker {
    ListingWalker::new(
        Arc::new(HttpTransport::new().unwrap()),
        Arc::new(RegexExtractor),
        Channel::Vijf.config().with_base_url(server.uri()),
    )
}

fn card(slug: &str, title: &str, timestamp: u64) -> String {
    format!(
        r#"<a class="card" data-background-image="https://img.vijf.be/{slug}.jpg?w=1&amp;h=2" href="/video/temptation/{slug}"><h3>{title}</h3>
  <div class="card__meta">42 min</div>
  <div class="card__date" data-timestamp="{timestamp}"></div></a>"#
    )
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_main_list_returns_programs_with_placeholder() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount(
        &server,
        "/programmas",
        ResponseTemplate::new(200).set_body_string(
            r#"<a class="program-overview__link" href="/temptation-island">Temptation Island</a>
<a class="program-overview__link" href="/de-bachelor">De Bachelor &amp; Co</a>"#,
        ),
    )
    .await;

    let page = walker(&server).fetch_main_list().await.unwrap();
    let episodes = page.episodes().collect::<Vec<_>>();

    assert_eq!(episodes.len(), 2);
    assert_eq!(episodes[1].meta.title, "De Bachelor & Co");
    assert_eq!(episodes[0].meta.thumbnail.as_deref(), Some("vijfimage.png"));
}

#[tokio::test]
async fn test_walk_follows_button_then_api_pages() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let program = format!(
        "{}\n{}\n{}",
        card("aflevering-1", "Aflevering 1", 1_577_836_800),
        card("aflevering-2", "Aflevering 2", 1_577_923_200),
        r#"<button class="button button--default js-load-more-button"
  data-url="/api/program/fixed/temptation-island"
  data-page="2">Meer</button>"#
    );
    mount(
        &server,
        "/temptation-island",
        ResponseTemplate::new(200).set_body_string(program),
    )
    .await;
    mount(
        &server,
        "/api/program/fixed/temptation-island/2",
        ResponseTemplate::new(200).set_body_json(json!({
            "data": card("aflevering-3", "Aflevering 3", 1_578_009_600),
            "loadMore": true
        })),
    )
    .await;
    mount(
        &server,
        "/api/program/fixed/temptation-island/3",
        ResponseTemplate::new(200).set_body_json(json!({
            "data": card("aflevering-4", "Aflevering 4", 1_578_096_000),
            "loadMore": false
        })),
    )
    .await;

    let pages = walker(&server)
        .walk("/temptation-island", 10)
        .await
        .unwrap();

    assert_eq!(pages.len(), 3);
    let titles = pages
        .iter()
        .flat_map(|page| page.videos().map(|video| video.meta.title.clone()))
        .collect::<Vec<_>>();
    assert_eq!(
        titles,
        vec!["Aflevering 1", "Aflevering 2", "Aflevering 3", "Aflevering 4"]
    );

    let first = pages[0].videos().next().unwrap();
    assert!(first.meta.is_geo_locked);
    assert_eq!(
        first.meta.thumbnail.as_deref(),
        Some("https://img.vijf.be/aflevering-1.jpg?w=1&h=2")
    );
    assert_eq!(
        first.timestamp().unwrap().to_rfc3339(),
        "2020-01-01T00:00:00+00:00"
    );

    let cursor_titles = pages
        .iter()
        .filter_map(|page| page.next_cursor().map(|cursor| cursor.meta.title.clone()))
        .collect::<Vec<_>>();
    assert_eq!(cursor_titles, vec!["3", "4"]);
}

#[tokio::test]
async fn test_api_page_with_html_body_is_invalid_payload() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount(
        &server,
        "/api/program/fixed/x/2",
        ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
    )
    .await;

    let err = walker(&server)
        .fetch("/api/program/fixed/x/2", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ListingError::InvalidPayload { .. }));
}

#[tokio::test]
async fn test_missing_page_is_transport_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount(&server, "/gone", ResponseTemplate::new(404)).await;

    let err = walker(&server).fetch("/gone", None).await.unwrap_err();
    assert!(matches!(err, ListingError::Transport(ref e) if e.status() == Some(404)));
}
