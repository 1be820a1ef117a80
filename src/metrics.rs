use std::time::Duration;

use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

/// Register descriptions so every series shows up on `/metrics`.
pub fn describe() {
    describe_counter!("likability_cache_hits_total", "Score cache lookups served from a live entry.");
    describe_counter!(
        "likability_cache_misses_total",
        "Score cache lookups that found nothing or an expired entry."
    );
    describe_counter!(
        "likability_fetch_errors_total",
        "Upstream fetch failures turned into absent signals, by source."
    );
    describe_counter!(
        "likability_summarizer_fallback_total",
        "Summaries produced from the template instead of the summarizer."
    );
    describe_histogram!("likability_compute_ms", "Fresh likability computation time in milliseconds.");
    describe_histogram!("likability_fetch_ms", "Upstream fetch time in milliseconds, by source.");
    describe_gauge!("likability_cache_ttl_secs", "Configured score cache TTL in seconds.");
    describe_gauge!("likability_history_subjects", "Subjects with trend history after the last sweep.");
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and publish the cache TTL.
    pub fn init(ttl: Duration) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        describe();
        gauge!("likability_cache_ttl_secs").set(ttl.as_secs() as f64);
        Ok(Self { handle })
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        router(self.handle.clone())
    }
}

pub fn router<S>(handle: PrometheusHandle) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/metrics",
        get(move || {
            let h = handle.clone();
            async move { h.render() }
        }),
    )
}
