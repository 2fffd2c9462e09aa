//! Metrics collection and exposition.
//!
//! # Metrics
//! - `logtree_write_errors_total` (counter): failed appender writes, by appender
//! - `logtree_encode_errors_total` (counter): records an encoder rejected, by appender
//! - `logtree_sync_errors_total` (counter): failed flushes, by appender
//! - `logtree_reconfigurations_total` (counter): by outcome (`applied`, `rejected`)
//! - `logtree_handles` (gauge): logger handles given out
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels stay low-cardinality: appender names and outcomes only

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

pub fn record_write_error(appender: &str) {
    metrics::counter!("logtree_write_errors_total", "appender" => appender.to_string()).increment(1);
}

pub fn record_encode_error(appender: &str) {
    metrics::counter!("logtree_encode_errors_total", "appender" => appender.to_string()).increment(1);
}

pub fn record_sync_error(appender: &str) {
    metrics::counter!("logtree_sync_errors_total", "appender" => appender.to_string()).increment(1);
}

pub fn record_reconfiguration(outcome: &'static str) {
    metrics::counter!("logtree_reconfigurations_total", "outcome" => outcome).increment(1);
}

pub fn record_handles(count: usize) {
    metrics::gauge!("logtree_handles").set(count as f64);
}

/// Serve Prometheus metrics on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(%addr, "metrics endpoint listening"),
        Err(error) => tracing::error!(%addr, %error, "failed to install metrics exporter"),
    }
}
