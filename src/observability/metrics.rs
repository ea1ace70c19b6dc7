//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, outcome, prefix, status
//! - `gateway_request_duration_seconds` (histogram): dispatch latency
//! - `gateway_routes` (gauge): registered routes
//! - `gateway_route_cache_hits_total` / `gateway_route_cache_misses_total` (counters)
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prefix label comes from the route table, so cardinality is bounded

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::{Method, StatusCode};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one dispatched request.
pub fn record_dispatch(
    method: &Method,
    outcome: &'static str,
    prefix: &str,
    status: StatusCode,
    start: Instant,
) {
    let timing_labels = [
        ("method", method.to_string()),
        ("outcome", outcome.to_string()),
        ("prefix", prefix.to_string()),
    ];
    metrics::histogram!("gateway_request_duration_seconds", &timing_labels)
        .record(start.elapsed().as_secs_f64());

    let [method_label, outcome_label, prefix_label] = timing_labels;
    let labels = [
        method_label,
        outcome_label,
        prefix_label,
        ("status", status.as_u16().to_string()),
    ];
    metrics::counter!("gateway_requests_total", &labels).increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    if hit {
        metrics::counter!("gateway_route_cache_hits_total").increment(1);
    } else {
        metrics::counter!("gateway_route_cache_misses_total").increment(1);
    }
}

pub fn set_route_count(count: usize) {
    metrics::gauge!("gateway_routes").set(count as f64);
}
