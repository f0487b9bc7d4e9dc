// src/http.rs
//! Outbound HTTP: one shared client with bounded timeouts, plus a GET helper
//! that retries transport failures with exponential backoff.

use std::time::Duration;

use reqwest::Client;

use crate::error::{DashboardError, Result};

const USER_AGENT: &str = "trend-pulse/0.1";

pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(4).min(timeout))
        .timeout(timeout)
        .build()
        .map_err(|e| DashboardError::Config(format!("http client: {e}")))
}

/// Body of a successful GET plus the upstream content type, if any.
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub body: String,
    pub content_type: Option<String>,
}

/// GET `url` with `query`, treating non-2xx as a transport failure.
/// Up to `retries` extra attempts, sleeping 500ms, 1s, 2s, ... in between.
pub async fn get_text_with_retry(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
    retries: u8,
) -> Result<TextResponse> {
    let mut attempt: u8 = 0;
    loop {
        attempt += 1;
        match get_text_once(client, url, query).await {
            Ok(resp) => return Ok(resp),
            Err(e) if attempt <= retries => {
                tracing::debug!(error = %e, attempt, url, "GET failed, retrying");
                tokio::time::sleep(backoff(attempt)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

fn backoff(attempt: u8) -> Duration {
    let shift = u32::from(attempt.saturating_sub(1)).min(6);
    Duration::from_millis(500u64 << shift)
}

async fn get_text_once(client: &Client, url: &str, query: &[(&str, &str)]) -> Result<TextResponse> {
    let resp = client
        .get(url)
        .query(query)
        .send()
        .await?
        .error_for_status()?;
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = resp.text().await?;
    Ok(TextResponse { body, content_type })
}
