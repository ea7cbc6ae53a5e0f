//! Table module providing multi-table support with an async actor model.
//!
//! This module implements:
//! - TableActor: async actor owning one table's `TableState`
//! - TableManager: registry that spawns actors and routes requests to them
//! - Timers: cancellable turn, showdown, restart, grace and rebuy clocks
//! - TableHost: the ledger and persistence callbacks a host must provide
//!
//! ## Architecture
//!
//! Each table runs in a separate Tokio task with an mpsc message inbox, so
//! everything that happens at one table is applied in order while tables
//! run in parallel. Timers post back into the same inbox; a turn timeout is
//! handled exactly like an action from the seat on the clock.
//!
//! ## Example
//!
//! ```ignore
//! use poker_tables::table::{TableConfig, TableManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let host = Arc::new(MyLedger::default());
//!     let manager = TableManager::new(host);
//!
//!     manager.get_or_create_table(1, TableConfig::default()).await?;
//!     manager.add_player(1, seat_request).await?;
//! }
//! ```

pub mod actor;
pub mod config;
pub mod errors;
pub mod host;
pub mod manager;
pub mod messages;
pub mod timers;

pub use actor::{TableActor, TableHandle};
pub use config::TableConfig;
pub use errors::{TableError, TableResult};
pub use host::{CreditRequest, HostError, RemovalReason, TableHost};
pub use manager::TableManager;
pub use messages::{ActionMessage, PlayerNotice, TableMessage, TableSummary, TableUpdate};
pub use timers::{TimerFired, TimerKind};
