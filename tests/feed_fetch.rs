// tests/feed_fetch.rs
use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use trend_pulse::feed::{self, FeedFetcher, FixtureFeed, ProxiedFeed};
use trend_pulse::http::build_client;
use trend_pulse::state::DashboardState;

const TRENDS_XML: &str = include_str!("fixtures/trends_rss.xml");
const SINGLE_XML: &str = include_str!("fixtures/trends_single.xml");

#[test]
fn fixture_sorted_newest_first_and_stable() {
    let entries = feed::parse_feed(TRENDS_XML).expect("parse trends fixture");
    let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
    // A and C share a timestamp; feed order decides.
    assert_eq!(titles, vec!["B", "A", "C"]);

    let a = &entries[1];
    assert_eq!(a.approx_traffic.as_deref(), Some("200+"));
    assert_eq!(a.related_headlines.len(), 2);
    assert_eq!(a.related_headlines[0].title, r#"A wins the "big" game"#);
    assert_eq!(a.related_headlines[0].url, "https://news.example.com/a-1");
    assert_eq!(a.related_headlines[1].title, "Fans react to A's comeback");

    assert!(entries[2].related_headlines.is_empty(), "no news items -> empty list");
}

#[test]
fn single_item_feed_is_a_one_element_list() {
    let entries = feed::parse_feed(SINGLE_XML).expect("parse single fixture");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Solo topic");
    assert_eq!(entries[0].related_headlines.len(), 1);
    assert_eq!(entries[0].headline_titles(), vec!["Only headline".to_string()]);
}

#[test]
fn bare_dates_scenario() {
    let xml = r#"<rss><channel>
        <item><title>A</title><pubDate>2024-01-02</pubDate></item>
        <item><title>B</title><pubDate>2024-01-03</pubDate></item>
    </channel></rss>"#;
    let entries = feed::parse_feed(xml).unwrap();
    let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["B", "A"]);
}

#[test]
fn empty_channel_yields_empty_list() {
    let entries = feed::parse_feed("<rss><channel><title>x</title></channel></rss>").unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn proxied_feed_passes_feed_url_as_query_param() {
    let mut server = mockito::Server::new_async().await;
    let feed_url = "https://trends.google.com/trending/rss?geo=US";
    let mock = server
        .mock("GET", "/rss-proxy")
        .match_query(Matcher::UrlEncoded("url".into(), feed_url.into()))
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(SINGLE_XML)
        .expect(1)
        .create_async()
        .await;

    let client = build_client(Duration::from_secs(5)).unwrap();
    let source = ProxiedFeed::new(client, format!("{}/rss-proxy", server.url()), feed_url);
    let entries = feed::fetch_feed(&source).await.expect("fetch via proxy");
    assert_eq!(entries.len(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn failed_refresh_leaves_previous_entries() {
    let state = DashboardState::new();

    let good = FeedFetcher::new(Arc::new(FixtureFeed::from_fixture(TRENDS_XML)));
    let published = good.refresh(&state).await.expect("first refresh ok");
    assert_eq!(published.len(), 3);
    let stamped = state.last_updated().expect("last_updated set");
    let generation = state.generation();

    let bad = FeedFetcher::new(Arc::new(FixtureFeed::from_fixture("<html>oops")));
    assert!(bad.refresh(&state).await.is_none());

    assert_eq!(state.entries().len(), 3);
    assert_eq!(state.last_updated(), Some(stamped));
    assert_eq!(state.generation(), generation);
    assert!(!state.is_loading());
    assert!(state.snapshot().last_error.is_some());
}

#[tokio::test]
async fn proxy_error_status_is_a_failed_refresh() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/rss-proxy")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let client = build_client(Duration::from_secs(5)).unwrap();
    let source = ProxiedFeed::new(client, format!("{}/rss-proxy", server.url()), "http://feed");
    let state = DashboardState::new();
    let fetcher = FeedFetcher::new(Arc::new(source));

    assert!(fetcher.refresh(&state).await.is_none());
    assert!(state.is_loading(), "still loading until a fetch succeeds");
    assert!(state.entries().is_empty());
}
