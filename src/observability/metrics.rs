//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): wallet service calls by operation, outcome
//! - `gateway_request_duration_seconds` (histogram): latency by operation
//! - `signatures_total` (counter): approvals signed, by outcome
//! - `transactions_total` (counter): orchestrated transactions by final outcome
//! - `poll_attempts_total` (counter): settlement polls by target

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_gateway_request(operation: &'static str, outcome: &'static str, elapsed: Duration) {
    counter!("gateway_requests_total", "operation" => operation, "outcome" => outcome).increment(1);
    histogram!("gateway_request_duration_seconds", "operation" => operation)
        .record(elapsed.as_secs_f64());
}

pub fn record_signature(outcome: &'static str) {
    counter!("signatures_total", "outcome" => outcome).increment(1);
}

pub fn record_transaction(outcome: &'static str) {
    counter!("transactions_total", "outcome" => outcome).increment(1);
}

pub fn record_poll_attempt(target: &'static str) {
    counter!("poll_attempts_total", "target" => target).increment(1);
}
