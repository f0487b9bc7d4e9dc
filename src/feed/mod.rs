// src/feed/mod.rs
pub mod parse;
pub mod providers;
pub mod types;

use std::sync::Arc;

use metrics::counter;

use crate::error::Result;
use crate::feed::types::{FeedSource, TrendEntry};
use crate::state::DashboardState;

pub use parse::{normalize_text, parse_items, parse_pub_date};
pub use providers::{FixtureFeed, ProxiedFeed};
pub use types::RelatedHeadline;

/// Newest first. `sort_by` is stable, so equal timestamps keep feed order;
/// entries without a date go last.
pub fn sort_newest_first(entries: &mut [TrendEntry]) {
    entries.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

/// Parse + sort.
pub fn parse_feed(xml: &str) -> Result<Vec<TrendEntry>> {
    let mut entries = parse_items(xml)?;
    sort_newest_first(&mut entries);
    Ok(entries)
}

/// One request to the source, then parse + sort.
pub async fn fetch_feed(source: &dyn FeedSource) -> Result<Vec<TrendEntry>> {
    let body = source.fetch_raw().await?;
    parse_feed(&body)
}

/// Runs fetches and publishes successful results into the dashboard state.
#[derive(Clone)]
pub struct FeedFetcher {
    source: Arc<dyn FeedSource>,
}

impl FeedFetcher {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        Self { source }
    }

    pub async fn fetch(&self) -> Result<Vec<TrendEntry>> {
        fetch_feed(self.source.as_ref()).await
    }

    /// On success the new entry set replaces the old one and `last_updated` is stamped.
    /// On failure the previous snapshot stays as it was; the error is logged and
    /// `None` is returned.
    pub async fn refresh(&self, state: &DashboardState) -> Option<Arc<Vec<TrendEntry>>> {
        counter!("feed_fetch_total").increment(1);
        match self.fetch().await {
            Ok(entries) => {
                let entries = Arc::new(entries);
                let generation = state.publish_entries(entries.clone(), chrono::Utc::now());
                tracing::info!(
                    target: "feed",
                    provider = self.source.name(),
                    entries = entries.len(),
                    generation,
                    "feed refreshed"
                );
                Some(entries)
            }
            Err(e) => {
                counter!("feed_fetch_errors_total").increment(1);
                tracing::warn!(
                    target: "feed",
                    error = %e,
                    provider = self.source.name(),
                    "feed refresh failed; keeping last good data"
                );
                state.record_fetch_error(e.to_string());
                None
            }
        }
    }
}
