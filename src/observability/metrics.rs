//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sidecar_reconcile_total` (counter): upstream syntheses by upstream, outcome
//! - `sidecar_apply_total` (counter): transactional applies by outcome
//! - `sidecar_apply_duration_seconds` (histogram): apply latency
//! - `sidecar_backend_slots` (gauge): slots per backend by state (active/disabled)

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_reconcile(upstream: &str, outcome: &'static str) {
    counter!(
        "sidecar_reconcile_total",
        "upstream" => upstream.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_apply(outcome: &'static str, start: Instant) {
    counter!("sidecar_apply_total", "outcome" => outcome).increment(1);
    histogram!("sidecar_apply_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_backend_slots(backend: &str, active: usize, disabled: usize) {
    gauge!("sidecar_backend_slots", "backend" => backend.to_string(), "state" => "active")
        .set(active as f64);
    gauge!("sidecar_backend_slots", "backend" => backend.to_string(), "state" => "disabled")
        .set(disabled as f64);
}
