//! Table-wide limits and default timings.

/// Most seats a single table can hold.
pub const MAX_SEATS: usize = 9;

/// Fewest seats a table can be configured with.
pub const MIN_SEATS: usize = 2;

/// Players needed to deal a hand.
pub const MIN_PLAYERS_TO_START: usize = 2;

pub const HOLE_CARDS: usize = 2;
pub const MAX_COMMUNITY_CARDS: usize = 5;
pub const DECK_SIZE: usize = 52;

pub const DEFAULT_SMALL_BLIND: u64 = 1;
pub const DEFAULT_BIG_BLIND: u64 = 2;

/// Seconds a seat has to act before a check/fold is forced.
pub const DEFAULT_TURN_TIME_SECS: u64 = 30;

/// Seconds a disconnected player keeps their seat.
pub const DEFAULT_DISCONNECT_GRACE_SECS: u64 = 60;

/// Seconds a busted seat has to rebuy before it is vacated.
pub const DEFAULT_REBUY_TIMEOUT_SECS: u64 = 60;

/// Delay between the end of one hand and the deal of the next.
pub const DEFAULT_NEXT_HAND_DELAY_MS: u64 = 3_000;

/// How long showdown results stay on the table before the hand ends.
pub const DEFAULT_SHOWDOWN_DELAY_MS: u64 = 4_000;
