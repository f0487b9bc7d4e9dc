// src/engagement/mod.rs
//! Social engagement for trend entries: one paced search per entry title,
//! counters summed across the returned posts.

pub mod bluesky;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::PipelineOptions;
use crate::error::Result;
use crate::feed::types::TrendEntry;

pub use bluesky::BlueskySearch;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocialPost {
    pub author_display_name: String,
    pub text: String,
    pub like_count: u64,
    pub repost_count: u64,
    pub reply_count: u64,
    pub indexed_at: Option<DateTime<Utc>>,
}

/// Derived per entry title. `Default` is the degraded value: zeros, no oldest post.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngagementStats {
    pub likes: u64,
    pub reposts: u64,
    pub replies: u64,
    pub oldest_post_at: Option<DateTime<Utc>>,
    pub posts: Vec<SocialPost>,
}

pub type EngagementMap = HashMap<String, EngagementStats>;

#[async_trait::async_trait]
pub trait PostSearch: Send + Sync {
    /// Posts matching `term`, newest first.
    async fn search_latest(&self, term: &str) -> Result<Vec<SocialPost>>;
    fn name(&self) -> &'static str;
}

pub fn aggregate(posts: Vec<SocialPost>, include_oldest: bool) -> EngagementStats {
    let mut stats = EngagementStats::default();
    for p in &posts {
        stats.likes = stats.likes.saturating_add(p.like_count);
        stats.reposts = stats.reposts.saturating_add(p.repost_count);
        stats.replies = stats.replies.saturating_add(p.reply_count);
    }
    if include_oldest {
        stats.oldest_post_at = posts.iter().filter_map(|p| p.indexed_at).min();
    }
    stats.posts = posts;
    stats
}

/// Sequential, paced enrichment. Query N+1 is only sent after query N has
/// resolved and `delay` has elapsed, also across passes and clones.
#[derive(Clone)]
pub struct Enricher {
    search: Arc<dyn PostSearch>,
    delay: Duration,
    include_oldest: bool,
    last_response: Arc<Mutex<Option<Instant>>>,
}

impl Enricher {
    pub fn new(search: Arc<dyn PostSearch>, delay: Duration) -> Self {
        Self {
            search,
            delay,
            include_oldest: true,
            last_response: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.include_oldest = options.include_oldest_post_date;
        self
    }

    async fn wait_for_slot(&self) {
        let last = *self.last_response.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(last) = last {
            tokio::time::sleep_until(last + self.delay).await;
        }
    }

    fn mark_response(&self) {
        *self.last_response.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
    }

    /// Builds a fresh map for the whole batch. A failed query degrades that entry to
    /// `EngagementStats::default()` and the loop moves on. Repeated titles share
    /// one query.
    pub async fn enrich(&self, entries: &[TrendEntry]) -> EngagementMap {
        let mut out = EngagementMap::with_capacity(entries.len());

        for entry in entries {
            if out.contains_key(&entry.title) {
                continue;
            }
            if entry.title.trim().is_empty() {
                out.insert(entry.title.clone(), EngagementStats::default());
                continue;
            }
            self.wait_for_slot().await;

            counter!("enrich_queries_total").increment(1);
            let response = self.search.search_latest(&entry.title).await;
            self.mark_response();
            let stats = match response {
                Ok(posts) => {
                    tracing::debug!(
                        target: "enrich",
                        title = %entry.title,
                        posts = posts.len(),
                        "engagement query ok"
                    );
                    aggregate(posts, self.include_oldest)
                }
                Err(e) => {
                    counter!("enrich_query_errors_total").increment(1);
                    tracing::warn!(
                        target: "enrich",
                        error = %e,
                        provider = self.search.name(),
                        title = %entry.title,
                        "engagement query failed; using zeroed stats"
                    );
                    EngagementStats::default()
                }
            };
            out.insert(entry.title.clone(), stats);
        }

        out
    }
}
