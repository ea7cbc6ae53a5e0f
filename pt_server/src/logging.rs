//! Structured logging configuration.
//!
//! The engine logs through the `log` facade; the subscriber installed here
//! picks those records up alongside the server's own `tracing` events.

use poker_tables::{
    entities::{Chips, PlayerId, TableId},
    table::RemovalReason,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging, with levels taken from `RUST_LOG`
///
/// # Example
///
/// ```no_run
/// use pt_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a seat vacated by a timer
pub fn log_forced_removal(
    table_id: TableId,
    player_id: PlayerId,
    seat: usize,
    reason: RemovalReason,
) {
    tracing::warn!(
        table_id = table_id,
        player_id = player_id,
        seat = seat,
        reason = %reason,
        "Seat force-removed"
    );
}

/// Log a ledger movement with structured data
pub fn log_ledger_movement(kind: &str, player_id: PlayerId, amount: Chips, balance: Chips) {
    tracing::info!(
        kind = kind,
        player_id = player_id,
        amount = amount,
        balance = balance,
        "Ledger {}",
        kind
    );
}
