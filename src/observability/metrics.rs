//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (requests, latency, commits)
//! - Expose a Prometheus-compatible endpoint when enabled
//!
//! # Metrics
//! - `digest_requests_total` (counter): dispatched requests by route, status
//! - `digest_request_duration_seconds` (histogram): handler latency by route
//! - `digest_unrouted_total` (counter): 404/405 responses by status
//! - `digest_commits_total` (counter): store values made visible
//! - `digest_commits_abandoned_total` (counter): commits cancelled at shutdown

use std::net::SocketAddr;
use std::time::Duration;

use ::metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint enabled");
    Ok(())
}

pub fn record_dispatch(route: &str, status: u16, elapsed: Duration) {
    counter!(
        "digest_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("digest_request_duration_seconds", "route" => route.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_unrouted(status: u16) {
    counter!("digest_unrouted_total", "status" => status.to_string()).increment(1);
}

pub fn record_commit() {
    counter!("digest_commits_total").increment(1);
}

pub fn record_commit_abandoned() {
    counter!("digest_commits_abandoned_total").increment(1);
}
