// src/feed/parse.rs
use chrono::{DateTime, Utc};
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{
    format_description::well_known::{Rfc2822, Rfc3339},
    macros::format_description,
    Date, OffsetDateTime,
};

use crate::error::{DashboardError, Result};
use crate::feed::types::{RelatedHeadline, TrendEntry};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    // A single <item> still lands here as a one-element Vec; none gives an empty one.
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "ht:approx_traffic", alias = "approx_traffic")]
    approx_traffic: Option<String>,
    #[serde(rename = "ht:news_item", alias = "news_item", default)]
    news_item: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    #[serde(rename = "ht:news_item_title", alias = "news_item_title")]
    title: Option<String>,
    #[serde(rename = "ht:news_item_url", alias = "news_item_url")]
    url: Option<String>,
}

/// Parse feed markup into entries in document order (unsorted).
pub fn parse_items(xml: &str) -> Result<Vec<TrendEntry>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).map_err(|e| DashboardError::Parse(e.to_string()))?;

    let out = rss
        .channel
        .item
        .into_iter()
        .map(|it| TrendEntry {
            title: it.title.as_deref().map(normalize_text).unwrap_or_default(),
            published_at: it.pub_date.as_deref().and_then(parse_pub_date),
            approx_traffic: it
                .approx_traffic
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            related_headlines: it
                .news_item
                .into_iter()
                .filter_map(|n| {
                    let title = normalize_text(n.title.as_deref()?);
                    if title.is_empty() {
                        return None;
                    }
                    Some(RelatedHeadline {
                        title,
                        url: n.url.map(|u| u.trim().to_string()).unwrap_or_default(),
                    })
                })
                .collect(),
        })
        .collect();

    histogram!("feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(out)
}

/// RFC 2822 (what RSS uses), then RFC 3339, then a bare `YYYY-MM-DD` at midnight UTC.
pub fn parse_pub_date(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    let odt = OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()
        .or_else(|| {
            Date::parse(ts, format_description!("[year]-[month]-[day]"))
                .ok()
                .map(|d| d.midnight().assume_utc())
        })?;
    DateTime::<Utc>::from_timestamp(odt.unix_timestamp(), odt.nanosecond())
}

/// Decode entities, strip stray tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    let stripped = re_tags.replace_all(&decoded, "");

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&stripped, " ").trim().to_string()
}

// HTML named entities are not valid XML; headlines copied from news sites carry them.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
