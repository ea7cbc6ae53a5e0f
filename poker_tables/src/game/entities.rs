use rand::{rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, str::FromStr};
use thiserror::Error;

use super::{constants, state_machine::ActionError};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

pub const SUITS: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Hearts => "♥",
            Self::Diamonds => "♦",
            Self::Clubs => "♣",
            Self::Spades => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Card rank, two through ace (2u8 ... 14u8).
pub type Value = u8;

pub const TWO: Value = 2;
pub const TEN: Value = 10;
pub const JACK: Value = 11;
pub const QUEEN: Value = 12;
pub const KING: Value = 13;
pub const ACE: Value = 14;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card {
    pub rank: Value,
    pub suit: Suit,
}

impl Card {
    #[must_use]
    pub const fn new(rank: Value, suit: Suit) -> Self {
        Self { rank, suit }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.rank {
            ACE => "A",
            KING => "K",
            QUEEN => "Q",
            JACK => "J",
            TEN => "T",
            v => &v.to_string(),
        };
        write!(f, "{value}{}", self.suit)
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("invalid card {0:?}")]
pub struct ParseCardError(pub String);

/// Parses the short form used in logs and tests, e.g. `"Ah"`, `"Td"`, `"2c"`.
impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(r), Some(u), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(ParseCardError(s.to_string()));
        };
        let rank = match r.to_ascii_uppercase() {
            'A' => ACE,
            'K' => KING,
            'Q' => QUEEN,
            'J' => JACK,
            'T' => TEN,
            d @ '2'..='9' => d as Value - b'0',
            _ => return Err(ParseCardError(s.to_string())),
        };
        let suit = match u.to_ascii_lowercase() {
            'h' => Suit::Hearts,
            'd' => Suit::Diamonds,
            'c' => Suit::Clubs,
            's' => Suit::Spades,
            _ => return Err(ParseCardError(s.to_string())),
        };
        Ok(Self::new(rank, suit))
    }
}

/// The 52 cards in canonical order: suit by suit, two through ace.
#[must_use]
pub fn create_deck() -> Vec<Card> {
    SUITS
        .iter()
        .flat_map(|&suit| (TWO..=ACE).map(move |rank| Card::new(rank, suit)))
        .collect()
}

/// Returns a uniformly shuffled copy of `cards`.
#[must_use]
pub fn shuffle(cards: &[Card]) -> Vec<Card> {
    let mut shuffled = cards.to_vec();
    shuffled.shuffle(&mut rng());
    shuffled
}

/// One hand's worth of cards plus a draw cursor that only moves forward.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
    cursor: usize,
}

impl Deck {
    #[must_use]
    pub fn shuffled() -> Self {
        Self::from_cards(shuffle(&create_deck()))
    }

    /// Builds a deck that deals `cards` in order. Panics on duplicates.
    #[must_use]
    pub fn from_cards(cards: Vec<Card>) -> Self {
        assert!(
            cards.len() <= constants::DECK_SIZE,
            "deck holds {} cards",
            cards.len()
        );
        let unique: HashSet<&Card> = cards.iter().collect();
        assert_eq!(unique.len(), cards.len(), "duplicate card in deck");
        Self { cards, cursor: 0 }
    }

    pub fn deal_card(&mut self) -> Card {
        assert!(self.cursor < self.cards.len(), "deck exhausted");
        let card = self.cards[self.cursor];
        self.cursor += 1;
        card
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.cursor
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::from_cards(create_deck())
    }
}

/// Whole chips. Stacks, bets, pots and rake are never fractional.
pub type Chips = u64;

pub type PlayerId = i64;

pub type TableId = i64;

/// Seat positions run `0..max_seats`; clockwise is increasing seat number.
pub type SeatNumber = usize;

/// Action names as they appear on the wire.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Fold => "fold",
            Self::Check => "check",
            Self::Call => "call",
            Self::Bet => "bet",
            Self::Raise => "raise",
            Self::AllIn => "all_in",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Action {
    Fold,
    Check,
    Call,
    /// Bet by this many chips.
    Bet(Chips),
    /// Raise by this many chips on top of the current bet.
    Raise(Chips),
    AllIn,
}

impl Action {
    /// Pairs an action name with its optional amount. `bet` and `raise`
    /// require one, the rest ignore it.
    pub fn from_parts(kind: ActionKind, amount: Option<Chips>) -> Result<Self, ActionError> {
        Ok(match kind {
            ActionKind::Fold => Self::Fold,
            ActionKind::Check => Self::Check,
            ActionKind::Call => Self::Call,
            ActionKind::AllIn => Self::AllIn,
            ActionKind::Bet => Self::Bet(amount.ok_or(ActionError::MissingAmount(kind))?),
            ActionKind::Raise => Self::Raise(amount.ok_or(ActionError::MissingAmount(kind))?),
        })
    }

    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Fold => ActionKind::Fold,
            Self::Check => ActionKind::Check,
            Self::Call => ActionKind::Call,
            Self::Bet(_) => ActionKind::Bet,
            Self::Raise(_) => ActionKind::Raise,
            Self::AllIn => ActionKind::AllIn,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Fold => "folds",
            Self::Check => "checks",
            Self::Call => "calls",
            Self::Bet(amount) => &format!("bets {amount}"),
            Self::Raise(amount) => &format!("raises {amount}"),
            Self::AllIn => "goes all-in",
        };
        write!(f, "{repr}")
    }
}

/// What the host hands over when seating a player. The buy-in has already
/// been taken from the player's balance.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeatRequest {
    pub player_id: PlayerId,
    pub seat_number: SeatNumber,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub buy_in: Chips,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Seat {
    pub player_id: PlayerId,
    pub seat_number: SeatNumber,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub stack: Chips,
    pub hole_cards: Vec<Card>,
    /// Chips put in on the current street.
    pub bet: Chips,
    /// Chips put in over the whole hand.
    pub contributed: Chips,
    /// Dealt into the current hand.
    pub in_hand: bool,
    pub folded: bool,
    pub all_in: bool,
    pub has_acted: bool,
    pub sitting_out: bool,
}

impl Seat {
    #[must_use]
    pub fn new(request: SeatRequest) -> Self {
        Self {
            player_id: request.player_id,
            seat_number: request.seat_number,
            display_name: request.display_name,
            photo_url: request.photo_url,
            stack: request.buy_in,
            hole_cards: Vec::with_capacity(constants::HOLE_CARDS),
            bet: 0,
            contributed: 0,
            in_hand: false,
            folded: false,
            all_in: false,
            has_acted: false,
            sitting_out: false,
        }
    }

    /// Still holding cards in the current hand.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.in_hand && !self.folded
    }

    /// Live and with chips behind, so still owes decisions.
    #[must_use]
    pub fn can_act(&self) -> bool {
        self.is_live() && !self.all_in
    }

    /// Can be dealt into the next hand.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.stack > 0 && !self.sitting_out
    }

    /// Moves up to `amount` chips from the stack into the street bet and
    /// returns how many actually moved.
    pub fn commit(&mut self, amount: Chips) -> Chips {
        let moved = amount.min(self.stack);
        self.stack -= moved;
        self.bet += moved;
        self.contributed += moved;
        if self.stack == 0 && self.in_hand {
            self.all_in = true;
        }
        moved
    }

    pub fn reset_for_hand(&mut self) {
        self.hole_cards.clear();
        self.bet = 0;
        self.contributed = 0;
        self.in_hand = false;
        self.folded = false;
        self.all_in = false;
        self.has_acted = false;
    }

    pub fn reset_for_street(&mut self) {
        self.bet = 0;
        self.has_acted = false;
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandStatus {
    #[default]
    Waiting,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl HandStatus {
    /// A betting street is in progress.
    #[must_use]
    pub fn is_betting(&self) -> bool {
        matches!(self, Self::Preflop | Self::Flop | Self::Turn | Self::River)
    }
}

impl fmt::Display for HandStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        };
        write!(f, "{repr}")
    }
}
