//! In-memory player balances.
//!
//! The server debits a balance before seating a player or accepting a rebuy;
//! tables hand chips back through [`TableHost::credit_balance`]. Every credit
//! carries an idempotency key, and a key that was already applied is
//! acknowledged without moving chips again.

use async_trait::async_trait;
use poker_tables::{
    entities::{Chips, PlayerId, SeatNumber, TableId},
    table::{CreditRequest, HostError, RemovalReason, TableHost},
};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{logging, metrics};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Chips, required: Chips },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Chips),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Default)]
struct Accounts {
    balances: HashMap<PlayerId, Chips>,
    applied_credits: HashSet<Uuid>,
    rake: Chips,
}

#[derive(Debug)]
pub struct Ledger {
    accounts: Mutex<Accounts>,
    starting_balance: Chips,
}

impl Ledger {
    /// Players the ledger has not seen yet open with `starting_balance`.
    pub fn new(starting_balance: Chips) -> Self {
        Self {
            accounts: Mutex::new(Accounts::default()),
            starting_balance,
        }
    }

    pub async fn balance(&self, player_id: PlayerId) -> Chips {
        let accounts = self.accounts.lock().await;
        accounts
            .balances
            .get(&player_id)
            .copied()
            .unwrap_or(self.starting_balance)
    }

    /// Take chips out of a balance. Returns the balance left.
    pub async fn debit(&self, player_id: PlayerId, amount: Chips) -> LedgerResult<Chips> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut accounts = self.accounts.lock().await;
        let balance = accounts
            .balances
            .entry(player_id)
            .or_insert(self.starting_balance);
        if *balance < amount {
            return Err(LedgerError::InsufficientBalance {
                available: *balance,
                required: amount,
            });
        }
        *balance -= amount;
        let remaining = *balance;
        drop(accounts);

        metrics::chips_debited(amount);
        logging::log_ledger_movement("debit", player_id, amount, remaining);
        Ok(remaining)
    }

    /// Put chips back. Returns false when the key was already applied.
    pub async fn credit(&self, request: &CreditRequest) -> bool {
        let mut accounts = self.accounts.lock().await;
        if !accounts.applied_credits.insert(request.idempotency_key) {
            log::debug!(
                "Credit {} for player {} already applied",
                request.idempotency_key,
                request.player_id
            );
            return false;
        }
        let balance = accounts
            .balances
            .entry(request.player_id)
            .or_insert(self.starting_balance);
        *balance = balance.saturating_add(request.amount);
        let total = *balance;
        drop(accounts);

        metrics::chips_credited(request.amount);
        logging::log_ledger_movement("credit", request.player_id, request.amount, total);
        true
    }

    /// Rake collected across all tables
    pub async fn rake_total(&self) -> Chips {
        self.accounts.lock().await.rake
    }
}

#[async_trait]
impl TableHost for Ledger {
    async fn credit_balance(&self, request: CreditRequest) -> Result<(), HostError> {
        self.credit(&request).await;
        Ok(())
    }

    async fn on_forced_removal(
        &self,
        table_id: TableId,
        player_id: PlayerId,
        seat: SeatNumber,
        reason: RemovalReason,
    ) {
        logging::log_forced_removal(table_id, player_id, seat, reason);
    }

    async fn on_rake_collected(&self, table_id: TableId, hand_number: u64, amount: Chips) {
        self.accounts.lock().await.rake += amount;
        metrics::rake_collected(amount);
        log::info!("Table {table_id}: hand #{hand_number} raked {amount}");
    }

    async fn on_seat_changed(
        &self,
        table_id: TableId,
        seat: SeatNumber,
        occupant: Option<PlayerId>,
    ) {
        match occupant {
            Some(player_id) => log::debug!("Table {table_id}: seat {seat} taken by {player_id}"),
            None => log::debug!("Table {table_id}: seat {seat} is free"),
        }
    }
}
