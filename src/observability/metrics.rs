//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): gate decisions by outcome
//! - `gate_request_duration_seconds` (histogram): time spent deciding
//! - `gate_upstream_errors_total` (counter): failed upstream exchanges
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Outcome labels: `allowed`, `not_found`, `validation_failed`, `body_too_large`

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

/// Record one gate decision.
pub fn record_decision(outcome: &'static str, start_time: Instant) {
    metrics::counter!("gate_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("gate_request_duration_seconds", "outcome" => outcome)
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_upstream_error() {
    metrics::counter!("gate_upstream_errors_total").increment(1);
}
