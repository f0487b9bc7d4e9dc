// src/config/dashboard.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
pub const ENV_FEED_URL: &str = "TRENDS_FEED_URL";
pub const ENV_PROXY_URL: &str = "TRENDS_PROXY_URL";
pub const ENV_REFRESH_SECS: &str = "TRENDS_REFRESH_SECS";

pub const DEFAULT_FEED_URL: &str = "https://trends.google.com/trending/rss?geo=US";
/// This service's own relay under `shuttle run` (port 8000). Deployments that
/// listen elsewhere must set `TRENDS_PROXY_URL`.
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:8000/rss-proxy";
pub const DEFAULT_SEARCH_URL: &str = "https://public.api.bsky.app/xrpc/app.bsky.feed.searchPosts";

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}
fn default_proxy_url() -> String {
    DEFAULT_PROXY_URL.to_string()
}
fn default_search_url() -> String {
    DEFAULT_SEARCH_URL.to_string()
}
fn default_refresh_interval_secs() -> u64 {
    60
}
fn default_enrich_delay_ms() -> u64 {
    1000
}
fn default_http_timeout_secs() -> u64 {
    10
}
fn default_http_retries() -> u8 {
    1
}
fn default_true() -> bool {
    true
}

/// Optional behaviors of the fetch/enrich pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    #[serde(default = "default_true")]
    pub include_oldest_post_date: bool,
    #[serde(default = "default_true")]
    pub include_summary_generation: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            include_oldest_post_date: true,
            include_summary_generation: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_enrich_delay_ms")]
    pub enrich_delay_ms: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_http_retries")]
    pub http_retries: u8,
    #[serde(default)]
    pub options: PipelineOptions,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            proxy_url: default_proxy_url(),
            search_url: default_search_url(),
            refresh_interval_secs: default_refresh_interval_secs(),
            enrich_delay_ms: default_enrich_delay_ms(),
            http_timeout_secs: default_http_timeout_secs(),
            http_retries: default_http_retries(),
            options: PipelineOptions::default(),
        }
    }
}

impl DashboardConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn enrich_delay(&self) -> Duration {
        Duration::from_millis(self.enrich_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// True while the feed is still routed through the local-run relay address.
    pub fn uses_local_proxy_default(&self) -> bool {
        self.proxy_url == DEFAULT_PROXY_URL
    }

    /// Zero interval/delay would spin the scheduler or defeat pacing.
    fn sanitize(mut self) -> Self {
        if self.refresh_interval_secs == 0 {
            self.refresh_interval_secs = default_refresh_interval_secs();
        }
        if self.enrich_delay_ms == 0 {
            self.enrich_delay_ms = default_enrich_delay_ms();
        }
        if self.http_timeout_secs == 0 {
            self.http_timeout_secs = default_http_timeout_secs();
        }
        self
    }

    fn apply_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var(ENV_FEED_URL) {
            if !v.trim().is_empty() {
                self.feed_url = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var(ENV_PROXY_URL) {
            if !v.trim().is_empty() {
                self.proxy_url = v.trim().to_string();
            }
        }
        if let Some(secs) = std::env::var(ENV_REFRESH_SECS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.refresh_interval_secs = secs;
        }
        self
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<DashboardConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading dashboard config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())?;
    Ok(cfg.sanitize())
}

/// Load config using env var + fallbacks:
/// 1) $DASHBOARD_CONFIG_PATH
/// 2) config/dashboard.toml
/// 3) config/dashboard.json
/// 4) built-in defaults
///
/// Env overrides (`TRENDS_FEED_URL`, `TRENDS_PROXY_URL`, `TRENDS_REFRESH_SECS`) win in every case.
pub fn load_config_default() -> Result<DashboardConfig> {
    let base = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("DASHBOARD_CONFIG_PATH points to non-existent path"));
        }
        load_config_from(&pb)?
    } else {
        let toml_p = PathBuf::from("config/dashboard.toml");
        let json_p = PathBuf::from("config/dashboard.json");
        if toml_p.exists() {
            load_config_from(&toml_p)?
        } else if json_p.exists() {
            load_config_from(&json_p)?
        } else {
            DashboardConfig::default()
        }
    };
    Ok(base.apply_env_overrides().sanitize())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<DashboardConfig> {
    match hint_ext {
        "json" => serde_json::from_str(s).context("parsing dashboard config json"),
        "toml" => toml::from_str(s).context("parsing dashboard config toml"),
        _ => {
            if let Ok(cfg) = serde_json::from_str(s) {
                return Ok(cfg);
            }
            toml::from_str(s).map_err(|_| anyhow!("unsupported dashboard config format"))
        }
    }
}
