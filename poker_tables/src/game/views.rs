//! Per-viewer snapshots of a table.
//!
//! `project` is the only place hole cards are redacted. It reads the
//! table and builds a fresh view every call; nothing is cached or mutated.

use serde::{Deserialize, Serialize};

use super::{
    entities::{Card, Chips, HandStatus, PlayerId, SeatNumber, TableId},
    state_machine::{TableState, Winner},
};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub seat_number: SeatNumber,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub chip_stack: Chips,
    pub bet_amount: Chips,
    pub in_hand: bool,
    pub folded: bool,
    pub all_in: bool,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    pub is_current_turn: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hole_cards: Option<Vec<Card>>,
    pub sitting_out: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableView {
    pub table_id: TableId,
    pub hand_number: u64,
    pub pot: Chips,
    pub community_cards: Vec<Card>,
    pub status: HandStatus,
    pub dealer_seat: Option<SeatNumber>,
    pub small_blind_seat: Option<SeatNumber>,
    pub big_blind_seat: Option<SeatNumber>,
    pub current_turn_seat: Option<SeatNumber>,
    pub current_bet: Chips,
    pub min_raise: Chips,
    pub players: Vec<PlayerView>,
    pub turn_time_seconds: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub winners: Vec<Winner>,
}

impl TableView {
    #[must_use]
    pub fn player(&self, seat: SeatNumber) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.seat_number == seat)
    }
}

/// Builds what `viewer` is allowed to see. Hole cards are included for the
/// viewer's own seat, and for every seat still holding cards once the hand
/// reaches showdown. `None` is a spectator.
#[must_use]
pub fn project(
    state: &TableState,
    table_id: TableId,
    viewer: Option<PlayerId>,
    turn_time_seconds: u64,
) -> TableView {
    let hand = state.hand();
    let showdown = hand.status == HandStatus::Showdown;

    let players = state
        .seats()
        .values()
        .map(|seat| {
            let visible = !seat.hole_cards.is_empty()
                && (viewer == Some(seat.player_id) || (showdown && seat.is_live()));
            PlayerView {
                player_id: seat.player_id,
                seat_number: seat.seat_number,
                display_name: seat.display_name.clone(),
                photo_url: seat.photo_url.clone(),
                chip_stack: seat.stack,
                bet_amount: seat.bet,
                in_hand: seat.in_hand,
                folded: seat.folded,
                all_in: seat.all_in,
                is_dealer: hand.dealer_seat == Some(seat.seat_number),
                is_small_blind: hand.small_blind_seat == Some(seat.seat_number),
                is_big_blind: hand.big_blind_seat == Some(seat.seat_number),
                is_current_turn: hand.current_turn == Some(seat.seat_number),
                hole_cards: visible.then(|| seat.hole_cards.clone()),
                sitting_out: seat.sitting_out,
            }
        })
        .collect();

    TableView {
        table_id,
        hand_number: hand.hand_number,
        pot: hand.pot,
        community_cards: hand.community_cards.clone(),
        status: hand.status,
        dealer_seat: hand.dealer_seat,
        small_blind_seat: hand.small_blind_seat,
        big_blind_seat: hand.big_blind_seat,
        current_turn_seat: hand.current_turn,
        current_bet: hand.current_bet,
        min_raise: hand.min_raise,
        players,
        turn_time_seconds,
        winners: hand.winners.clone(),
    }
}
