//! Prometheus metrics for monitoring server health.
//!
//! Metrics are exposed in Prometheus text format when a scrape address is
//! configured. Without an installed recorder every call below is a no-op.
//!
//! # Metrics Categories
//!
//! - **WebSocket Metrics**: Active connections, messages received
//! - **Game Metrics**: Active tables, rejected actions, rake
//! - **Ledger Metrics**: Buy-ins and refunds

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// A socket opened.
pub fn websocket_connected() {
    metrics::counter!("websocket_connections_total").increment(1);
    metrics::gauge!("websocket_connections_active").increment(1.0);
}

/// A socket closed.
pub fn websocket_disconnected() {
    metrics::gauge!("websocket_connections_active").decrement(1.0);
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Set current active tables count.
pub fn active_tables(count: usize) {
    metrics::gauge!("active_tables").set(count as f64);
}

/// Record a command the table refused.
pub fn commands_rejected(command: &'static str) {
    metrics::counter!("commands_rejected_total", "command" => command).increment(1);
}

/// Record rake taken from a pot.
pub fn rake_collected(amount: u64) {
    metrics::counter!("rake_collected_chips").increment(amount);
}

// ============================================================================
// Ledger Metrics
// ============================================================================

/// Chips moved from a balance onto a table.
pub fn chips_debited(amount: u64) {
    metrics::counter!("ledger_debited_chips").increment(amount);
}

/// Chips returned from a table to a balance.
pub fn chips_credited(amount: u64) {
    metrics::counter!("ledger_credited_chips").increment(amount);
}
