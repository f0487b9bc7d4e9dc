use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and describe the pipeline series.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        describe();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("feed_fetch_total", "Feed refresh attempts.");
    describe_counter!("feed_fetch_errors_total", "Feed refreshes that kept the previous data.");
    describe_counter!("feed_transport_errors_total", "Feed proxy requests that failed.");
    describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
    describe_counter!("enrich_queries_total", "Engagement search queries sent.");
    describe_counter!("enrich_query_errors_total", "Engagement queries degraded to zeroed stats.");
    describe_counter!(
        "enrich_pass_discarded_total",
        "Enrichment passes dropped because the scheduler was cancelled."
    );
    describe_counter!("summary_requests_total", "Summary generation calls sent upstream.");
    describe_counter!("summary_errors_total", "Summary generation failures.");
}
