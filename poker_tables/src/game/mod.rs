//! Poker game engine - cards, hand ranking and the per-table state machine.
//!
//! This module provides:
//! - Card and deck model with an explicit draw cursor
//! - Five-of-seven hand evaluation with ordered kickers
//! - Side pot, rake and split arithmetic
//! - The hand lifecycle (`TableState`) and per-viewer projection

pub mod constants;
pub mod entities;
pub mod functional;
pub mod pot;
pub mod state_machine;
pub mod views;

pub use state_machine::{
    ActionError, GameSettings, Hand, SeatError, StartError, TableEvent, TableState, Winner,
};
pub use views::{PlayerView, TableView, project};
