//! WebSocket host for `poker_tables`.
//!
//! Owns one [`poker_tables::TableManager`] and an in-memory [`ledger::Ledger`]
//! that funds buy-ins and receives refunds, and serves both over HTTP and
//! WebSocket.

pub mod api;
pub mod config;
pub mod ledger;
pub mod logging;
pub mod metrics;
