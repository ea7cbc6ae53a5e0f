//! Callbacks a table needs from whatever process hosts it.
//!
//! The engine never owns balances. Chips leave a table only through
//! `credit_balance`, and every call carries its own idempotency key so a
//! retried credit is applied once.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::game::entities::{Chips, PlayerId, SeatNumber, TableId};

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum HostError {
    #[error("Ledger rejected credit: {0}")]
    Ledger(String),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Why a seat was vacated without the player asking.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// Disconnect grace period ran out
    Disconnected,
    /// Busted and did not rebuy in time
    RebuyTimeout,
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalReason::Disconnected => write!(f, "disconnected"),
            RemovalReason::RebuyTimeout => write!(f, "rebuy timeout"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreditRequest {
    pub table_id: TableId,
    pub player_id: PlayerId,
    pub amount: Chips,
    pub idempotency_key: Uuid,
}

impl CreditRequest {
    pub fn new(table_id: TableId, player_id: PlayerId, amount: Chips) -> Self {
        Self {
            table_id,
            player_id,
            amount,
            idempotency_key: Uuid::new_v4(),
        }
    }
}

#[async_trait]
pub trait TableHost: Send + Sync {
    /// Return chips from a table to the player's balance.
    async fn credit_balance(&self, request: CreditRequest) -> Result<(), HostError>;

    /// A seat was vacated by a timer rather than by the player.
    async fn on_forced_removal(
        &self,
        table_id: TableId,
        player_id: PlayerId,
        seat: SeatNumber,
        reason: RemovalReason,
    );

    /// Rake taken from a finished pot.
    async fn on_rake_collected(&self, _table_id: TableId, _hand_number: u64, _amount: Chips) {}

    /// Seat occupancy changed; `None` means the seat is now empty.
    async fn on_seat_changed(
        &self,
        _table_id: TableId,
        _seat: SeatNumber,
        _occupant: Option<PlayerId>,
    ) {
    }
}
