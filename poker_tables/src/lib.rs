//! # Poker Tables
//!
//! A multiplayer Texas Hold'em table engine: cards and hand ranking, a
//! per-table betting state machine with side pots and rake, and an async
//! actor per table with turn timers and disconnect grace periods.
//!
//! ## Architecture
//!
//! A hand moves through these statuses:
//!
//! - **Waiting**: between hands, seats can join, leave and rebuy
//! - **Preflop**: blinds posted, hole cards dealt
//! - **Flop/Turn/River**: community cards dealt, one betting street each
//! - **Showdown**: hands revealed and pots settled
//!
//! A hand where everyone but one seat folds goes straight back to
//! **Waiting** with the pot awarded.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, evaluator, pots, state machine and per-viewer projection
//! - [`table`]: Table actors, the manager and the host collaborator trait
//!
//! ## Example
//!
//! ```
//! use poker_tables::{GameSettings, TableState};
//!
//! // An empty table waiting for players
//! let table = TableState::new(GameSettings::default());
//! assert!(!table.can_start_hand());
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    ActionError, GameSettings, SeatError, StartError, TableEvent, TableState, TableView,
    constants,
    entities::{self, Action, ActionKind, Card, Chips, HandStatus, PlayerId, SeatNumber, TableId},
    functional::{self, HandCategory, HandResult},
    project,
};

/// Table actors and the multi-table manager.
pub mod table;
pub use table::{TableConfig, TableError, TableHost, TableManager, TableUpdate};
