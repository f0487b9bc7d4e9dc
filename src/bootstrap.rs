// src/bootstrap.rs
//! Wires config, clients, state, router and the refresh scheduler together.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tracing::{info, warn};

use crate::api::{self, AppState};
use crate::config::ai::AiConfig;
use crate::config::DashboardConfig;
use crate::engagement::{BlueskySearch, Enricher};
use crate::feed::{FeedFetcher, ProxiedFeed};
use crate::http::build_client;
use crate::scheduler::{spawn_refresh_scheduler, RefreshSchedulerCfg, SchedulerHandle};
use crate::state::DashboardState;
use crate::summary::{OpenAiGenerator, SummaryGenerator};

pub struct App {
    pub router: Router,
    pub state: DashboardState,
    pub scheduler: SchedulerHandle,
}

/// The credential is resolved here and handed to the client; nothing below
/// this point reads the environment.
pub fn build_summary_generator(ai: Option<AiConfig>) -> anyhow::Result<Option<SummaryGenerator>> {
    let Some(ai) = ai else {
        warn!("summary generation not configured (no OPENAI_API_KEY / config/ai.json)");
        return Ok(None);
    };
    // Safe diagnostics: provider + model + key length only
    info!(
        "AI cfg loaded: provider={}, model={}, key_len={}",
        ai.provider,
        ai.model,
        ai.api_key.len()
    );
    let generator = OpenAiGenerator::new(ai.api_key, ai.model).context("building OpenAI client")?;
    Ok(Some(SummaryGenerator::new(Arc::new(generator))))
}

pub fn build_state(
    cfg: &DashboardConfig,
    dashboard: DashboardState,
    summaries: Option<SummaryGenerator>,
) -> anyhow::Result<AppState> {
    let http = build_client(cfg.http_timeout()).context("building http client")?;
    Ok(AppState {
        dashboard,
        http,
        proxy_retries: cfg.http_retries,
        summaries,
        options: cfg.options,
    })
}

/// Build the router and start fetching. Must run inside a tokio runtime.
pub fn start(cfg: &DashboardConfig, ai: Option<AiConfig>) -> anyhow::Result<App> {
    let dashboard = DashboardState::new();
    let summaries = build_summary_generator(ai)?;
    let app_state = build_state(cfg, dashboard.clone(), summaries)?;

    if cfg.uses_local_proxy_default() {
        warn!(
            proxy = %cfg.proxy_url,
            "feed relay points at the local-run address; set TRENDS_PROXY_URL when deployed"
        );
    }
    let feed = ProxiedFeed::new(app_state.http.clone(), &cfg.proxy_url, &cfg.feed_url)
        .with_retries(cfg.http_retries);
    let fetcher = FeedFetcher::new(Arc::new(feed));
    let search = BlueskySearch::new(app_state.http.clone(), &cfg.search_url);
    let enricher = Enricher::new(Arc::new(search), cfg.enrich_delay()).with_options(cfg.options);

    let scheduler = spawn_refresh_scheduler(
        RefreshSchedulerCfg {
            interval: cfg.refresh_interval(),
        },
        fetcher,
        enricher,
        dashboard.clone(),
    );
    info!(
        feed = %cfg.feed_url,
        proxy = %cfg.proxy_url,
        interval_secs = cfg.refresh_interval_secs,
        "refresh scheduler started"
    );

    Ok(App {
        router: api::router(app_state),
        state: dashboard,
        scheduler,
    })
}
