//! Metrics collection and exposition.
//!
//! # Metrics
//! - `apimock_requests_total` (counter): requests by method, status and outcome
//! - `apimock_request_duration_seconds` (histogram): dispatch latency
//! - `apimock_proxy_errors_total` (counter): forwarding failures by kind
//! - `apimock_module_reloads_total` (counter): route file reloads by result
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one dispatched request. `outcome` is `local`, `proxied` or an error kind.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "apimock_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("apimock_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_proxy_error(kind: &'static str) {
    metrics::counter!("apimock_proxy_errors_total", "kind" => kind).increment(1);
}

pub fn record_module_reload(result: &'static str) {
    metrics::counter!("apimock_module_reloads_total", "result" => result).increment(1);
}
