//! Trends dashboard backend: binary entrypoint.
//! Boots the Axum server (feed relay, summary endpoint, dashboard snapshot) and
//! the background refresh scheduler.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trend_pulse::bootstrap;
use trend_pulse::config::{ai::AiConfig, load_config_default};
use trend_pulse::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - TRENDS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("TRENDS_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trend_pulse=debug,feed=info,enrich=info,warn"));

    // Shuttle may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = load_config_default()?;
    let ai = AiConfig::load_default()?;
    let app = bootstrap::start(&cfg, ai)?;

    let router = match Metrics::init() {
        Ok(m) => app.router.merge(m.router()),
        Err(e) => {
            tracing::warn!(error = %e, "metrics recorder not installed");
            app.router
        }
    };

    // Stop the scheduler on shutdown; until then the task keeps the handle alive.
    let scheduler = app.scheduler;
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            scheduler.cancel();
        }
        scheduler.join().await;
    });

    Ok(router.into())
}
