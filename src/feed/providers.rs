// src/feed/providers.rs
use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;

use crate::error::Result;
use crate::feed::types::FeedSource;
use crate::http::get_text_with_retry;

/// Fetches the feed through the relay endpoint: `GET <proxy_url>?url=<feed_url>`.
pub struct ProxiedFeed {
    client: Client,
    proxy_url: String,
    feed_url: String,
    retries: u8,
}

impl ProxiedFeed {
    pub fn new(client: Client, proxy_url: impl Into<String>, feed_url: impl Into<String>) -> Self {
        Self {
            client,
            proxy_url: proxy_url.into(),
            feed_url: feed_url.into(),
            retries: 0,
        }
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }
}

#[async_trait]
impl FeedSource for ProxiedFeed {
    async fn fetch_raw(&self) -> Result<String> {
        let resp = get_text_with_retry(
            &self.client,
            &self.proxy_url,
            &[("url", self.feed_url.as_str())],
            self.retries,
        )
        .await
        .inspect_err(|e| {
            tracing::warn!(error = %e, provider = "proxied", "feed proxy http error");
            counter!("feed_transport_errors_total").increment(1);
        })?;
        Ok(resp.body)
    }

    fn name(&self) -> &'static str {
        "proxied"
    }
}

/// Serves a fixed body; local runs and tests.
pub struct FixtureFeed {
    body: String,
}

impl FixtureFeed {
    pub fn from_fixture(body: &str) -> Self {
        Self {
            body: body.to_string(),
        }
    }
}

#[async_trait]
impl FeedSource for FixtureFeed {
    async fn fetch_raw(&self) -> Result<String> {
        Ok(self.body.clone())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
