//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_connections_total` (counter): accepted client connections
//! - `proxy_active_connections` (gauge): connections currently being served
//! - `proxy_requests_total` (counter): finished connections by outcome
//! - `proxy_request_duration_seconds` (histogram): time from accept to close
//! - `proxy_bytes_total` (counter): bytes sent to origins and relayed to clients

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_connection_opened() {
    metrics::counter!("proxy_connections_total").increment(1);
    metrics::gauge!("proxy_active_connections").increment(1.0);
}

pub fn record_connection_closed() {
    metrics::gauge!("proxy_active_connections").decrement(1.0);
}

/// Record how a connection ended and how long it took.
pub fn record_outcome(outcome: &'static str, started: Instant) {
    metrics::counter!("proxy_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

/// Record bytes moved in one direction (`upstream` or `downstream`).
pub fn record_bytes(direction: &'static str, bytes: usize) {
    metrics::counter!("proxy_bytes_total", "direction" => direction).increment(bytes as u64);
}
