//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::errors::{TableError, TableResult};
use crate::game::{
    GameSettings,
    constants::{
        DEFAULT_BIG_BLIND, DEFAULT_DISCONNECT_GRACE_SECS, DEFAULT_NEXT_HAND_DELAY_MS,
        DEFAULT_REBUY_TIMEOUT_SECS, DEFAULT_SHOWDOWN_DELAY_MS, DEFAULT_SMALL_BLIND,
        DEFAULT_TURN_TIME_SECS, MAX_SEATS, MIN_SEATS,
    },
    entities::Chips,
};

fn default_turn_time_secs() -> u64 {
    DEFAULT_TURN_TIME_SECS
}

fn default_disconnect_grace_secs() -> u64 {
    DEFAULT_DISCONNECT_GRACE_SECS
}

fn default_rebuy_timeout_secs() -> u64 {
    DEFAULT_REBUY_TIMEOUT_SECS
}

fn default_next_hand_delay_ms() -> u64 {
    DEFAULT_NEXT_HAND_DELAY_MS
}

fn default_showdown_delay_ms() -> u64 {
    DEFAULT_SHOWDOWN_DELAY_MS
}

/// Table configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name
    #[serde(default)]
    pub name: String,

    /// Small blind amount
    pub small_blind: Chips,

    /// Big blind amount
    pub big_blind: Chips,

    /// House cut of each pot in percent (0-100)
    #[serde(default)]
    pub rake_percent: f64,

    /// Most rake taken from a single hand
    #[serde(default)]
    pub rake_cap: Chips,

    /// Number of seats (2-9)
    pub max_seats: usize,

    /// Seconds a player has to act
    #[serde(default = "default_turn_time_secs")]
    pub turn_time_secs: u64,

    /// Seconds a disconnected player keeps their seat
    #[serde(default = "default_disconnect_grace_secs")]
    pub disconnect_grace_secs: u64,

    /// Seconds a busted player has to rebuy
    #[serde(default = "default_rebuy_timeout_secs")]
    pub rebuy_timeout_secs: u64,

    /// Pause between hands
    #[serde(default = "default_next_hand_delay_ms")]
    pub next_hand_delay_ms: u64,

    /// How long showdown results stay up
    #[serde(default = "default_showdown_delay_ms")]
    pub showdown_delay_ms: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            rake_percent: 0.0,
            rake_cap: 0,
            max_seats: MAX_SEATS,
            turn_time_secs: DEFAULT_TURN_TIME_SECS,
            disconnect_grace_secs: DEFAULT_DISCONNECT_GRACE_SECS,
            rebuy_timeout_secs: DEFAULT_REBUY_TIMEOUT_SECS,
            next_hand_delay_ms: DEFAULT_NEXT_HAND_DELAY_MS,
            showdown_delay_ms: DEFAULT_SHOWDOWN_DELAY_MS,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> TableResult<()> {
        if self.small_blind == 0 {
            return Err(TableError::InvalidConfig(
                "Small blind must be positive".to_string(),
            ));
        }

        if self.big_blind < self.small_blind {
            return Err(TableError::InvalidConfig(
                "Big blind must be at least the small blind".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&self.rake_percent) {
            return Err(TableError::InvalidConfig(
                "Rake percent must be between 0 and 100".to_string(),
            ));
        }

        if !(MIN_SEATS..=MAX_SEATS).contains(&self.max_seats) {
            return Err(TableError::InvalidConfig(format!(
                "Max seats must be between {MIN_SEATS} and {MAX_SEATS}"
            )));
        }

        if self.turn_time_secs == 0 {
            return Err(TableError::InvalidConfig(
                "Turn time must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Engine settings for this table
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            rake_percent: self.rake_percent,
            rake_cap: self.rake_cap,
            max_seats: self.max_seats,
        }
    }

    pub fn turn_time(&self) -> Duration {
        Duration::from_secs(self.turn_time_secs)
    }

    pub fn disconnect_grace(&self) -> Duration {
        Duration::from_secs(self.disconnect_grace_secs)
    }

    pub fn rebuy_timeout(&self) -> Duration {
        Duration::from_secs(self.rebuy_timeout_secs)
    }

    pub fn next_hand_delay(&self) -> Duration {
        Duration::from_millis(self.next_hand_delay_ms)
    }

    pub fn showdown_delay(&self) -> Duration {
        Duration::from_millis(self.showdown_delay_ms)
    }
}
