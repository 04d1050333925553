//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_backend_online` (gauge): 1=online, 0=offline or removed, per backend
//! - `router_backend_connections` (gauge): tracked connection count, per backend
//! - `router_probes_total` (counter): probe outcomes by result
//! - `router_backend_removed_total` (counter): backends dropped as unresolvable
//! - `router_count_underflow_total` (counter): disconnects with no matching connect
//! - `router_reloads_total` (counter): config reloads by result
//! - `router_selections_total` (counter): routing queries by result

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::load_balancer::{BackendId, BackendState};

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_backend_state(id: &BackendId, state: &BackendState) {
    let backend = id.to_string();
    gauge!("router_backend_online", "backend" => backend.clone()).set(if state.online { 1.0 } else { 0.0 });
    gauge!("router_backend_connections", "backend" => backend).set(state.connection_count as f64);
}

/// Zero the gauges of a backend that left the registry. The facade cannot
/// unregister a series, so removed backends export 0 instead.
pub fn clear_backend_state(id: &BackendId) {
    let backend = id.to_string();
    gauge!("router_backend_online", "backend" => backend.clone()).set(0.0);
    gauge!("router_backend_connections", "backend" => backend).set(0.0);
}

pub fn record_probe(result: &'static str) {
    counter!("router_probes_total", "result" => result).increment(1);
}

pub fn record_backend_removed(id: &BackendId) {
    counter!("router_backend_removed_total", "backend" => id.to_string()).increment(1);
}

pub fn record_count_underflow(id: &BackendId) {
    counter!("router_count_underflow_total", "backend" => id.to_string()).increment(1);
}

pub fn record_reload(result: &'static str) {
    counter!("router_reloads_total", "result" => result).increment(1);
}

pub fn record_selection(found: bool) {
    let result = if found { "selected" } else { "none" };
    counter!("router_selections_total", "result" => result).increment(1);
}
