// src/metrics.rs
//! Prometheus exposition plus the handful of series the service records.
//!
//! Only the HTTP layer calls the `record_*` helpers; ranking code stays free
//! of side effects.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use shuttle_axum::axum::{routing::get, Router};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

fn describe_all() {
    describe_counter!("feeds_stored_total", "Feed snapshots written via PUT /feeds.");
    describe_counter!("feed_items_stored_total", "Items contained in stored snapshots.");
    describe_counter!("views_served_total", "Dashboard views served, by view.");
    describe_counter!("items_scored_total", "Items scored via POST /score.");
    describe_counter!("items_classified_total", "Items classified via POST /classify.");
    describe_counter!("feed_cache_stale_reads_total", "Views served from a stale snapshot.");
    describe_histogram!("view_items", "Items returned per view.");
    describe_gauge!("feed_cache_age_ms", "Age of the snapshot behind the last view.");
}

impl Metrics {
    /// Install the Prometheus recorder once per process; later calls share the handle.
    pub fn init() -> Self {
        let handle = HANDLE
            .get_or_init(|| {
                let handle = match PrometheusBuilder::new().install_recorder() {
                    Ok(h) => h,
                    Err(e) => {
                        // another recorder owns the process; render an empty registry
                        tracing::warn!(error = %e, "prometheus recorder not installed");
                        PrometheusBuilder::new().build_recorder().handle()
                    }
                };
                describe_all();
                handle
            })
            .clone();
        Self { handle }
    }

    /// `/metrics` in the Prometheus text format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
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

pub fn record_feeds_stored(feeds: usize, items: usize) {
    counter!("feeds_stored_total").increment(1);
    counter!("feed_items_stored_total").increment(items as u64);
    tracing::debug!(feeds, items, "feed snapshot stored");
}

pub fn record_view(view: &'static str, items: usize) {
    counter!("views_served_total", "view" => view).increment(1);
    histogram!("view_items", "view" => view).record(items as f64);
}

pub fn record_cache_read(age_ms: i64, stale: bool) {
    gauge!("feed_cache_age_ms").set(age_ms as f64);
    if stale {
        counter!("feed_cache_stale_reads_total").increment(1);
    }
}

pub fn record_scored(n: usize) {
    counter!("items_scored_total").increment(n as u64);
}

pub fn record_classified(n: usize) {
    counter!("items_classified_total").increment(n as u64);
}
