//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): guarded requests by outcome
//! - `gateway_request_duration_seconds` (histogram): latency by outcome
//! - `gateway_rate_limited_total` (counter): denials by matched prefix
//! - `gateway_cors_rejected_total` (counter): origin rejections, preflight or not
//! - `gateway_signature_failures_total` (counter): webhook auth failures
//! - `gateway_limiter_keys` (gauge): tracked rate limit keys
//! - `gateway_incidents_total` (counter): incident commands by action

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: &'static str, start: Instant) {
    counter!("gateway_requests_total", "outcome" => outcome).increment(1);
    histogram!("gateway_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(prefix: &str) {
    counter!("gateway_rate_limited_total", "prefix" => prefix.to_string()).increment(1);
}

pub fn record_cors_rejected(preflight: bool) {
    let preflight = if preflight { "true" } else { "false" };
    counter!("gateway_cors_rejected_total", "preflight" => preflight).increment(1);
}

pub fn record_signature_failure() {
    counter!("gateway_signature_failures_total").increment(1);
}

pub fn record_limiter_keys(count: usize) {
    gauge!("gateway_limiter_keys").set(count as f64);
}

pub fn record_incident_command(action: &'static str) {
    counter!("gateway_incidents_total", "action" => action).increment(1);
}
