//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use poker_tables::{
    GameSettings, TableConfig, TableState,
    entities::{Card, Chips, Deck, PlayerId, SeatNumber, SeatRequest, TableId, create_deck},
    table::{CreditRequest, HostError, RemovalReason, TableHost},
};
use std::sync::Mutex;

/// Host that records every callback.
#[derive(Default)]
pub struct RecordingHost {
    pub credits: Mutex<Vec<CreditRequest>>,
    pub removals: Mutex<Vec<(TableId, PlayerId, SeatNumber, RemovalReason)>>,
    pub rake: Mutex<Vec<(TableId, u64, Chips)>>,
    pub seat_changes: Mutex<Vec<(TableId, SeatNumber, Option<PlayerId>)>>,
}

impl RecordingHost {
    pub fn credited(&self, player_id: PlayerId) -> Chips {
        self.credits
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.player_id == player_id)
            .map(|c| c.amount)
            .sum()
    }

    pub fn removals(&self) -> Vec<(TableId, PlayerId, SeatNumber, RemovalReason)> {
        self.removals.lock().unwrap().clone()
    }
}

#[async_trait]
impl TableHost for RecordingHost {
    async fn credit_balance(&self, request: CreditRequest) -> Result<(), HostError> {
        self.credits.lock().unwrap().push(request);
        Ok(())
    }

    async fn on_forced_removal(
        &self,
        table_id: TableId,
        player_id: PlayerId,
        seat: SeatNumber,
        reason: RemovalReason,
    ) {
        self.removals
            .lock()
            .unwrap()
            .push((table_id, player_id, seat, reason));
    }

    async fn on_rake_collected(&self, table_id: TableId, hand_number: u64, amount: Chips) {
        self.rake.lock().unwrap().push((table_id, hand_number, amount));
    }

    async fn on_seat_changed(&self, table_id: TableId, seat: SeatNumber, occupant: Option<PlayerId>) {
        self.seat_changes
            .lock()
            .unwrap()
            .push((table_id, seat, occupant));
    }
}

/// Player IDs are `100 + seat`.
pub fn player(seat: SeatNumber) -> PlayerId {
    100 + seat as PlayerId
}

pub fn seat_request(seat_number: SeatNumber, buy_in: Chips) -> SeatRequest {
    SeatRequest {
        player_id: player(seat_number),
        seat_number,
        display_name: format!("seat{seat_number}"),
        photo_url: None,
        buy_in,
    }
}

pub fn blinds(small_blind: Chips, big_blind: Chips) -> GameSettings {
    GameSettings {
        small_blind,
        big_blind,
        ..GameSettings::default()
    }
}

/// Seats 0..n with the given stacks.
pub fn table_with(settings: GameSettings, stacks: &[Chips]) -> TableState {
    let mut state = TableState::new(settings);
    for (seat, &stack) in stacks.iter().enumerate() {
        state.add_seat(seat_request(seat, stack)).unwrap();
    }
    state
}

/// Parses `"Ah Kd 7c"`.
pub fn cards(s: &str) -> Vec<Card> {
    s.split_whitespace().map(|c| c.parse().unwrap()).collect()
}

/// Deals `top` first, then the rest of the deck in canonical order.
pub fn stacked_deck(top: &str) -> Deck {
    let mut order = cards(top);
    let rest: Vec<Card> = create_deck()
        .into_iter()
        .filter(|c| !order.contains(c))
        .collect();
    order.extend(rest);
    Deck::from_cards(order)
}

/// Config with timers long enough that only the one under test matters.
pub fn quiet_config() -> TableConfig {
    TableConfig {
        name: "test".to_string(),
        turn_time_secs: 3_600,
        disconnect_grace_secs: 3_600,
        rebuy_timeout_secs: 3_600,
        next_hand_delay_ms: 3_600_000,
        ..TableConfig::default()
    }
}
