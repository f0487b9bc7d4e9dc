// src/engagement/bluesky.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::engagement::{PostSearch, SocialPost};
use crate::error::{DashboardError, Result};

#[derive(Debug, Deserialize)]
struct SearchResp {
    #[serde(default)]
    posts: Vec<RawPost>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPost {
    #[serde(default)]
    author: RawAuthor,
    #[serde(default)]
    record: RawRecord,
    like_count: Option<u64>,
    repost_count: Option<u64>,
    reply_count: Option<u64>,
    indexed_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAuthor {
    display_name: Option<String>,
    handle: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    text: Option<String>,
}

impl From<RawPost> for SocialPost {
    fn from(p: RawPost) -> Self {
        let author_display_name = p
            .author
            .display_name
            .filter(|n| !n.trim().is_empty())
            .or(p.author.handle)
            .unwrap_or_default();
        SocialPost {
            author_display_name,
            text: p.record.text.unwrap_or_default(),
            like_count: p.like_count.unwrap_or(0),
            repost_count: p.repost_count.unwrap_or(0),
            reply_count: p.reply_count.unwrap_or(0),
            indexed_at: p
                .indexed_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Public Bluesky `app.bsky.feed.searchPosts` endpoint (no auth).
pub struct BlueskySearch {
    client: Client,
    search_url: String,
}

impl BlueskySearch {
    pub fn new(client: Client, search_url: impl Into<String>) -> Self {
        Self {
            client,
            search_url: search_url.into(),
        }
    }
}

#[async_trait]
impl PostSearch for BlueskySearch {
    async fn search_latest(&self, term: &str) -> Result<Vec<SocialPost>> {
        let resp = self
            .client
            .get(&self.search_url)
            .query(&[("q", term), ("sort", "latest")])
            .send()
            .await?
            .error_for_status()?;
        let body: SearchResp = resp
            .json()
            .await
            .map_err(|e| DashboardError::Transport(format!("search response: {e}")))?;
        Ok(body.posts.into_iter().map(SocialPost::from).collect())
    }

    fn name(&self) -> &'static str {
        "bluesky"
    }
}
