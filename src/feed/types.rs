// src/feed/types.rs
use crate::error::Result;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RelatedHeadline {
    pub title: String,
    pub url: String,
}

/// One trending topic; rebuilt on every fetch.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct TrendEntry {
    pub title: String,
    pub published_at: Option<DateTime<Utc>>, // None when pubDate is missing/unparseable
    pub approx_traffic: Option<String>,      // e.g. "200+"
    pub related_headlines: Vec<RelatedHeadline>,
}

impl TrendEntry {
    pub fn headline_titles(&self) -> Vec<String> {
        self.related_headlines.iter().map(|h| h.title.clone()).collect()
    }
}

/// Where raw feed markup comes from.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_raw(&self) -> Result<String>;
    fn name(&self) -> &'static str;
}
