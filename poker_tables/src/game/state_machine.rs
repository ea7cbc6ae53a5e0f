//! Hand lifecycle for a single table: blinds, dealing, betting streets,
//! turn order, showdown and settlement.
//!
//! `TableState` is plain data plus synchronous transitions. It knows
//! nothing about timers, channels or the host; the table actor drives it
//! and turns its events into notifications.

use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, VecDeque},
    fmt,
};
use thiserror::Error;

use super::{
    constants::{DEFAULT_BIG_BLIND, DEFAULT_SMALL_BLIND, HOLE_CARDS, MAX_SEATS, MIN_PLAYERS_TO_START},
    entities::{
        Action, ActionKind, Card, Chips, Deck, HandStatus, PlayerId, Seat, SeatNumber, SeatRequest,
    },
    functional::{self, HandCategory, HandResult},
    pot::{self, Contribution},
};

/// Why an action was turned away. State is untouched whenever one of
/// these comes back.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum ActionError {
    #[error("no hand in progress")]
    NoHandInProgress,
    #[error("not your turn")]
    OutOfTurnAction,
    #[error("already folded")]
    AlreadyFolded,
    #[error("already all-in")]
    AlreadyAllIn,
    #[error("can't check, {to_call} to call")]
    CannotCheck { to_call: Chips },
    #[error("raise of {amount} is below the minimum of {min_raise}")]
    RaiseTooSmall { amount: Chips, min_raise: Chips },
    #[error("need {needed} chips, have {stack}")]
    InsufficientChips { needed: Chips, stack: Chips },
    #[error("{0} needs an amount")]
    MissingAmount(ActionKind),
}

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum SeatError {
    #[error("seat {0} is taken")]
    SeatOccupied(SeatNumber),
    #[error("seat {seat} doesn't exist, table has {max_seats} seats")]
    SeatOutOfRange { seat: SeatNumber, max_seats: usize },
    #[error("seat {0} is empty")]
    EmptySeat(SeatNumber),
    #[error("player {0} is already seated")]
    AlreadySeated(PlayerId),
    #[error("player {0} is not seated")]
    PlayerNotSeated(PlayerId),
    #[error("chip amount must be positive")]
    InvalidAmount,
    #[error("seat {0} is playing a hand")]
    InHand(SeatNumber),
    #[error("seat {0} has no chips, rebuy first")]
    NoChips(SeatNumber),
}

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum StartError {
    #[error("need 2+ players with chips")]
    NotEnoughPlayers,
    #[error("hand already in progress")]
    HandInProgress,
}

/// Things that happened at the table, oldest first.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum TableEvent {
    SeatTaken {
        seat: SeatNumber,
        player_id: PlayerId,
        buy_in: Chips,
    },
    SeatVacated {
        seat: SeatNumber,
        player_id: PlayerId,
        stack: Chips,
    },
    Rebought {
        seat: SeatNumber,
        amount: Chips,
    },
    HandStarted {
        hand_number: u64,
        dealer: SeatNumber,
    },
    BlindPosted {
        seat: SeatNumber,
        amount: Chips,
    },
    ActionTaken {
        seat: SeatNumber,
        action: Action,
    },
    StreetDealt {
        status: HandStatus,
        cards: Vec<Card>,
    },
    PotAwarded {
        seat: SeatNumber,
        amount: Chips,
        hand: Option<HandCategory>,
    },
    RakeCollected(Chips),
    /// Pot left behind when every live seat left mid-hand
    PotUnclaimed(Chips),
    HandEnded {
        hand_number: u64,
    },
    PlayerBusted {
        seat: SeatNumber,
        player_id: PlayerId,
    },
}

impl fmt::Display for TableEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::SeatTaken {
                seat,
                player_id,
                buy_in,
            } => format!("player {player_id} sat at seat {seat} with {buy_in}"),
            Self::SeatVacated {
                seat,
                player_id,
                stack,
            } => format!("player {player_id} left seat {seat} with {stack}"),
            Self::Rebought { seat, amount } => format!("seat {seat} rebought {amount}"),
            Self::HandStarted {
                hand_number,
                dealer,
            } => format!("hand #{hand_number} started, button on seat {dealer}"),
            Self::BlindPosted { seat, amount } => format!("seat {seat} posts {amount}"),
            Self::ActionTaken { seat, action } => format!("seat {seat} {action}"),
            Self::StreetDealt { status, cards } => {
                let cards: Vec<String> = cards.iter().map(ToString::to_string).collect();
                format!("{status}: {}", cards.join(" "))
            }
            Self::PotAwarded {
                seat,
                amount,
                hand: Some(hand),
            } => format!("seat {seat} wins {amount} with {hand}"),
            Self::PotAwarded {
                seat,
                amount,
                hand: None,
            } => format!("seat {seat} wins {amount}"),
            Self::RakeCollected(amount) => format!("rake {amount}"),
            Self::PotUnclaimed(amount) => format!("{amount} left unclaimed"),
            Self::HandEnded { hand_number } => format!("hand #{hand_number} over"),
            Self::PlayerBusted { seat, player_id } => {
                format!("player {player_id} at seat {seat} is out of chips")
            }
        };
        write!(f, "{repr}")
    }
}

/// Engine-facing table settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub small_blind: Chips,
    pub big_blind: Chips,
    /// Percent of each pot the house keeps, 0 to 100.
    pub rake_percent: f64,
    pub rake_cap: Chips,
    pub max_seats: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            rake_percent: 0.0,
            rake_cap: 0,
            max_seats: MAX_SEATS,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Winner {
    pub seat: SeatNumber,
    pub player_id: PlayerId,
    pub amount: Chips,
    /// `None` when everyone else folded and no cards were shown.
    pub hand: Option<HandResult>,
}

/// The current (or most recently finished) hand.
#[derive(Clone, Debug, Default)]
pub struct Hand {
    pub hand_number: u64,
    pub pot: Chips,
    pub community_cards: Vec<Card>,
    pub status: HandStatus,
    pub dealer_seat: Option<SeatNumber>,
    pub small_blind_seat: Option<SeatNumber>,
    pub big_blind_seat: Option<SeatNumber>,
    pub current_turn: Option<SeatNumber>,
    pub current_bet: Chips,
    pub min_raise: Chips,
    pub last_aggressor: Option<SeatNumber>,
    pub rake_collected: Chips,
    /// Pot nobody was left to win; never reported as rake.
    pub unclaimed: Chips,
    pub winners: Vec<Winner>,
    /// Chips left behind by seats that were vacated mid-hand.
    departed: Vec<Contribution>,
}

#[derive(Debug)]
pub struct TableState {
    settings: GameSettings,
    seats: BTreeMap<SeatNumber, Seat>,
    hand: Hand,
    deck: Deck,
    events: VecDeque<TableEvent>,
}

impl TableState {
    #[must_use]
    pub fn new(settings: GameSettings) -> Self {
        Self {
            settings,
            seats: BTreeMap::new(),
            hand: Hand::default(),
            deck: Deck::default(),
            events: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    #[must_use]
    pub fn status(&self) -> HandStatus {
        self.hand.status
    }

    #[must_use]
    pub fn current_turn(&self) -> Option<SeatNumber> {
        self.hand.current_turn
    }

    #[must_use]
    pub fn seats(&self) -> &BTreeMap<SeatNumber, Seat> {
        &self.seats
    }

    #[must_use]
    pub fn seat(&self, seat: SeatNumber) -> Option<&Seat> {
        self.seats.get(&seat)
    }

    #[must_use]
    pub fn seat_of(&self, player_id: PlayerId) -> Option<SeatNumber> {
        self.seats
            .values()
            .find(|s| s.player_id == player_id)
            .map(|s| s.seat_number)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Every chip on the table: stacks plus the pot.
    #[must_use]
    pub fn total_chips(&self) -> Chips {
        self.seats.values().map(|s| s.stack).sum::<Chips>() + self.hand.pot
    }

    pub fn drain_events(&mut self) -> VecDeque<TableEvent> {
        std::mem::take(&mut self.events)
    }

    // === Seating ===

    pub fn add_seat(&mut self, request: SeatRequest) -> Result<(), SeatError> {
        if request.seat_number >= self.settings.max_seats {
            return Err(SeatError::SeatOutOfRange {
                seat: request.seat_number,
                max_seats: self.settings.max_seats,
            });
        }
        if self.seats.contains_key(&request.seat_number) {
            return Err(SeatError::SeatOccupied(request.seat_number));
        }
        if self.seat_of(request.player_id).is_some() {
            return Err(SeatError::AlreadySeated(request.player_id));
        }
        if request.buy_in == 0 {
            return Err(SeatError::InvalidAmount);
        }

        self.events.push_back(TableEvent::SeatTaken {
            seat: request.seat_number,
            player_id: request.player_id,
            buy_in: request.buy_in,
        });
        self.seats.insert(request.seat_number, Seat::new(request));
        Ok(())
    }

    /// Vacates a seat and hands it back so the caller can refund its
    /// stack. A seat still in a hand is folded first; whatever it already
    /// put in stays in the pot.
    pub fn remove_seat(&mut self, seat_number: SeatNumber) -> Result<Seat, SeatError> {
        let seat = self
            .seats
            .get(&seat_number)
            .ok_or(SeatError::EmptySeat(seat_number))?;

        if self.hand.status.is_betting() && seat.can_act() {
            if self.hand.current_turn == Some(seat_number) {
                if let Err(e) = self.handle_action(seat_number, Action::Fold) {
                    unreachable!("folding on turn was rejected: {e}");
                }
            } else if let Some(seat) = self.seats.get_mut(&seat_number) {
                seat.folded = true;
                self.events.push_back(TableEvent::ActionTaken {
                    seat: seat_number,
                    action: Action::Fold,
                });
            }
        }

        let Some(mut seat) = self.seats.remove(&seat_number) else {
            return Err(SeatError::EmptySeat(seat_number));
        };
        if self.hand.status.is_betting() && seat.in_hand {
            seat.folded = true;
            if seat.contributed > 0 {
                self.hand.departed.push(Contribution {
                    seat: seat_number,
                    amount: seat.contributed,
                    folded: true,
                });
            }
        }
        self.events.push_back(TableEvent::SeatVacated {
            seat: seat_number,
            player_id: seat.player_id,
            stack: seat.stack,
        });

        if self.hand.status.is_betting() {
            if self.live_count() <= 1 {
                self.award_fold_out();
            } else if self.is_street_complete() {
                self.advance_street();
            }
        }
        Ok(seat)
    }

    pub fn rebuy(&mut self, seat_number: SeatNumber, amount: Chips) -> Result<(), SeatError> {
        if amount == 0 {
            return Err(SeatError::InvalidAmount);
        }
        let in_hand = self.hand.status != HandStatus::Waiting;
        let seat = self
            .seats
            .get_mut(&seat_number)
            .ok_or(SeatError::EmptySeat(seat_number))?;
        if in_hand && seat.is_live() {
            return Err(SeatError::InHand(seat_number));
        }
        seat.stack = seat
            .stack
            .checked_add(amount)
            .ok_or(SeatError::InvalidAmount)?;
        seat.sitting_out = false;
        self.events.push_back(TableEvent::Rebought {
            seat: seat_number,
            amount,
        });
        Ok(())
    }

    /// Sitting out only affects who gets dealt into the next hand.
    pub fn set_sitting_out(
        &mut self,
        seat_number: SeatNumber,
        sitting_out: bool,
    ) -> Result<(), SeatError> {
        let seat = self
            .seats
            .get_mut(&seat_number)
            .ok_or(SeatError::EmptySeat(seat_number))?;
        if !sitting_out && seat.stack == 0 {
            return Err(SeatError::NoChips(seat_number));
        }
        seat.sitting_out = sitting_out;
        Ok(())
    }

    // === Hand lifecycle ===

    fn eligible_seats(&self) -> Vec<SeatNumber> {
        self.seats
            .values()
            .filter(|s| s.is_eligible())
            .map(|s| s.seat_number)
            .collect()
    }

    #[must_use]
    pub fn can_start_hand(&self) -> bool {
        self.hand.status == HandStatus::Waiting
            && self.eligible_seats().len() >= MIN_PLAYERS_TO_START
    }

    pub fn start_new_hand(&mut self) -> Result<(), StartError> {
        self.start_hand_with_deck(Deck::shuffled())
    }

    /// Starts a hand dealing from `deck` in order. Hole cards go out one
    /// at a time starting left of the button, then the board follows
    /// without burns.
    pub fn start_hand_with_deck(&mut self, deck: Deck) -> Result<(), StartError> {
        if self.hand.status != HandStatus::Waiting {
            return Err(StartError::HandInProgress);
        }
        let eligible = self.eligible_seats();
        if eligible.len() < MIN_PLAYERS_TO_START {
            return Err(StartError::NotEnoughPlayers);
        }

        for seat in self.seats.values_mut() {
            seat.reset_for_hand();
            seat.in_hand = seat.is_eligible();
        }

        let dealer = match self.hand.dealer_seat {
            Some(prev) => self.next_in_hand_after(prev),
            None => eligible[0],
        };
        let (small_blind, big_blind) = if eligible.len() == 2 {
            (dealer, self.next_in_hand_after(dealer))
        } else {
            let small_blind = self.next_in_hand_after(dealer);
            (small_blind, self.next_in_hand_after(small_blind))
        };

        self.hand = Hand {
            hand_number: self.hand.hand_number + 1,
            status: HandStatus::Preflop,
            dealer_seat: Some(dealer),
            small_blind_seat: Some(small_blind),
            big_blind_seat: Some(big_blind),
            current_bet: self.settings.big_blind,
            min_raise: self.settings.big_blind,
            ..Hand::default()
        };
        self.deck = deck;
        self.events.push_back(TableEvent::HandStarted {
            hand_number: self.hand.hand_number,
            dealer,
        });

        self.post_blind(small_blind, self.settings.small_blind);
        self.post_blind(big_blind, self.settings.big_blind);

        let deal_order: Vec<SeatNumber> = self
            .clockwise_after(dealer)
            .into_iter()
            .filter(|n| self.seats[n].in_hand)
            .collect();
        for _ in 0..HOLE_CARDS {
            for seat in &deal_order {
                let card = self.deck.deal_card();
                if let Some(seat) = self.seats.get_mut(seat) {
                    seat.hole_cards.push(card);
                }
            }
        }

        self.progress(big_blind);
        Ok(())
    }

    fn post_blind(&mut self, seat_number: SeatNumber, blind: Chips) {
        let amount = self.commit(seat_number, blind);
        self.events.push_back(TableEvent::BlindPosted {
            seat: seat_number,
            amount,
        });
    }

    /// Applies an action from `seat_number`. Nothing changes on error.
    pub fn handle_action(
        &mut self,
        seat_number: SeatNumber,
        action: Action,
    ) -> Result<(), ActionError> {
        if !self.hand.status.is_betting() {
            return Err(ActionError::NoHandInProgress);
        }
        let seat = self
            .seats
            .get(&seat_number)
            .ok_or(ActionError::OutOfTurnAction)?;
        if seat.in_hand && seat.folded {
            return Err(ActionError::AlreadyFolded);
        }
        if seat.in_hand && seat.all_in {
            return Err(ActionError::AlreadyAllIn);
        }
        if self.hand.current_turn != Some(seat_number) {
            return Err(ActionError::OutOfTurnAction);
        }

        let to_call = self.hand.current_bet.saturating_sub(seat.bet);
        let before = self.chips_in_play();

        match action {
            Action::Fold => {
                if let Some(seat) = self.seats.get_mut(&seat_number) {
                    seat.folded = true;
                }
            }
            Action::Check => {
                if to_call > 0 {
                    return Err(ActionError::CannotCheck { to_call });
                }
            }
            Action::Call => {
                self.commit(seat_number, to_call);
            }
            Action::Bet(amount) | Action::Raise(amount) => {
                if amount < self.hand.min_raise {
                    return Err(ActionError::RaiseTooSmall {
                        amount,
                        min_raise: self.hand.min_raise,
                    });
                }
                let new_total = if self.hand.current_bet > 0 {
                    self.hand.current_bet.checked_add(amount)
                } else {
                    Some(amount)
                };
                let needed = match new_total.map(|total| total.saturating_sub(seat.bet)) {
                    Some(needed) if needed <= seat.stack => needed,
                    needed => {
                        return Err(ActionError::InsufficientChips {
                            needed: needed.unwrap_or(Chips::MAX),
                            stack: seat.stack,
                        });
                    }
                };
                let new_total = seat.bet + needed;
                self.commit(seat_number, needed);
                self.raise_to(seat_number, new_total);
                self.hand.min_raise = amount;
            }
            Action::AllIn => {
                let stack = seat.stack;
                self.commit(seat_number, stack);
                let total = self.seats[&seat_number].bet;
                if total > self.hand.current_bet {
                    let increment = total - self.hand.current_bet;
                    self.raise_to(seat_number, total);
                    self.hand.min_raise = self.hand.min_raise.max(increment);
                }
            }
        }

        if let Some(seat) = self.seats.get_mut(&seat_number) {
            seat.has_acted = true;
        }
        assert_eq!(before, self.chips_in_play(), "chips drifted during an action");
        self.events.push_back(TableEvent::ActionTaken {
            seat: seat_number,
            action,
        });

        self.progress(seat_number);
        Ok(())
    }

    /// Action forced on the seat whose turn it is: check when that's
    /// legal, otherwise fold. Returns `None` when nobody is on the clock.
    pub fn apply_timeout(&mut self) -> Option<(SeatNumber, Action)> {
        let seat_number = self.hand.current_turn?;
        let seat = self.seats.get(&seat_number)?;
        let action = if seat.bet >= self.hand.current_bet {
            Action::Check
        } else {
            Action::Fold
        };
        self.handle_action(seat_number, action).ok()?;
        Some((seat_number, action))
    }

    /// Closes out a hand after showdown (or a no-op when already waiting).
    /// Returns seats that finished the hand with no chips; they are sat
    /// out until they rebuy.
    pub fn end_hand(&mut self) -> Vec<SeatNumber> {
        if self.hand.status == HandStatus::Waiting {
            return Vec::new();
        }
        assert_eq!(self.hand.pot, 0, "hand ended with chips left in the pot");

        self.hand.status = HandStatus::Waiting;
        self.hand.current_turn = None;
        self.hand.departed.clear();

        let mut busted = Vec::new();
        for seat in self.seats.values_mut() {
            if seat.in_hand && seat.stack == 0 {
                seat.sitting_out = true;
                busted.push(seat.seat_number);
                self.events.push_back(TableEvent::PlayerBusted {
                    seat: seat.seat_number,
                    player_id: seat.player_id,
                });
            }
        }
        self.events.push_back(TableEvent::HandEnded {
            hand_number: self.hand.hand_number,
        });
        busted
    }

    // === Betting internals ===

    /// Stacks, pot and rake taken this hand. Constant across any action.
    fn chips_in_play(&self) -> Chips {
        self.total_chips() + self.hand.rake_collected + self.hand.unclaimed
    }

    fn commit(&mut self, seat_number: SeatNumber, amount: Chips) -> Chips {
        let moved = self
            .seats
            .get_mut(&seat_number)
            .map_or(0, |seat| seat.commit(amount));
        self.hand.pot += moved;
        moved
    }

    fn raise_to(&mut self, seat_number: SeatNumber, total: Chips) {
        self.hand.current_bet = total;
        self.hand.last_aggressor = Some(seat_number);
        for seat in self.seats.values_mut() {
            if seat.seat_number != seat_number && seat.can_act() {
                seat.has_acted = false;
            }
        }
    }

    fn live_count(&self) -> usize {
        self.seats.values().filter(|s| s.is_live()).count()
    }

    /// Occupied seats clockwise from just after `start`, wrapping around.
    /// `start` itself comes last when occupied.
    fn clockwise_after(&self, start: SeatNumber) -> Vec<SeatNumber> {
        self.seats
            .range(start + 1..)
            .chain(self.seats.range(..=start))
            .map(|(n, _)| *n)
            .collect()
    }

    fn next_in_hand_after(&self, start: SeatNumber) -> SeatNumber {
        self.clockwise_after(start)
            .into_iter()
            .find(|n| self.seats[n].in_hand)
            .unwrap_or(start)
    }

    fn needs_to_act(&self, seat: &Seat) -> bool {
        seat.can_act() && (!seat.has_acted || seat.bet < self.hand.current_bet)
    }

    fn next_to_act(&self, after: SeatNumber) -> Option<SeatNumber> {
        self.clockwise_after(after)
            .into_iter()
            .find(|n| self.needs_to_act(&self.seats[n]))
    }

    /// Every seat that can still act has acted and matched the bet. With
    /// one such seat left it only has to have matched.
    fn is_street_complete(&self) -> bool {
        let actors: Vec<&Seat> = self.seats.values().filter(|s| s.can_act()).collect();
        match actors.as_slice() {
            [] => true,
            [only] => only.bet >= self.hand.current_bet,
            _ => actors
                .iter()
                .all(|s| s.has_acted && s.bet == self.hand.current_bet),
        }
    }

    fn progress(&mut self, after: SeatNumber) {
        if self.live_count() <= 1 {
            self.award_fold_out();
        } else if self.is_street_complete() {
            self.advance_street();
        } else {
            self.hand.current_turn = self.next_to_act(after);
            assert!(
                self.hand.current_turn.is_some(),
                "street is open but nobody is left to act"
            );
        }
    }

    fn advance_street(&mut self) {
        loop {
            for seat in self.seats.values_mut() {
                seat.reset_for_street();
            }
            self.hand.current_bet = 0;
            self.hand.min_raise = self.settings.big_blind;
            self.hand.current_turn = None;

            let (next, count) = match self.hand.status {
                HandStatus::Preflop => (HandStatus::Flop, 3),
                HandStatus::Flop => (HandStatus::Turn, 1),
                HandStatus::Turn => (HandStatus::River, 1),
                _ => {
                    self.showdown();
                    return;
                }
            };
            let cards: Vec<Card> = (0..count).map(|_| self.deck.deal_card()).collect();
            self.hand.community_cards.extend(&cards);
            self.hand.status = next;
            self.events.push_back(TableEvent::StreetDealt {
                status: next,
                cards,
            });

            if !self.is_street_complete() {
                let dealer = self.hand.dealer_seat.unwrap_or_default();
                self.hand.current_turn = self.next_to_act(dealer);
                return;
            }
        }
    }

    // === Settlement ===

    /// Seats holding cards, in payout order: first left of the button.
    fn live_seats_from_button(&self) -> Vec<SeatNumber> {
        let dealer = self.hand.dealer_seat.unwrap_or_default();
        self.clockwise_after(dealer)
            .into_iter()
            .filter(|n| self.seats[n].is_live())
            .collect()
    }

    fn take_rake(&mut self) -> Chips {
        let rake = pot::compute_rake(
            self.hand.pot,
            self.settings.rake_percent,
            self.settings.rake_cap,
        );
        if rake > 0 {
            self.hand.rake_collected += rake;
            self.events.push_back(TableEvent::RakeCollected(rake));
        }
        rake
    }

    fn award_fold_out(&mut self) {
        let live = self.live_seats_from_button();
        assert!(live.len() <= 1, "fold-out with {} live seats", live.len());

        if let Some(&winner) = live.first() {
            let rake = self.take_rake();
            let amount = self.hand.pot - rake;
            if let Some(seat) = self.seats.get_mut(&winner) {
                seat.stack += amount;
                self.hand.winners = vec![Winner {
                    seat: winner,
                    player_id: seat.player_id,
                    amount,
                    hand: None,
                }];
                self.events.push_back(TableEvent::PotAwarded {
                    seat: winner,
                    amount,
                    hand: None,
                });
            }
        } else {
            // The last live seat left the table and its refund already
            // carried its stack. Nobody can claim the pot, so no rake either.
            let amount = self.hand.pot;
            self.hand.unclaimed += amount;
            self.events.push_back(TableEvent::PotUnclaimed(amount));
        }
        self.hand.pot = 0;
        self.hand.current_turn = None;
        self.end_hand();
    }

    fn showdown(&mut self) {
        self.hand.status = HandStatus::Showdown;
        self.hand.current_turn = None;

        let payout_order = self.live_seats_from_button();
        let results: BTreeMap<SeatNumber, HandResult> = payout_order
            .iter()
            .map(|n| {
                let seat = &self.seats[n];
                (
                    *n,
                    functional::evaluate(&seat.hole_cards, &self.hand.community_cards),
                )
            })
            .collect();

        let mut contributions: Vec<Contribution> = self
            .seats
            .values()
            .filter(|s| s.in_hand)
            .map(|s| Contribution {
                seat: s.seat_number,
                amount: s.contributed,
                folded: s.folded,
            })
            .collect();
        contributions.extend(self.hand.departed.iter().copied());

        let pot_size = self.hand.pot;
        let mut pots = pot::build_pots(&contributions);
        let rake = self.take_rake();
        pot::take_rake(&mut pots, rake);

        let mut awarded: BTreeMap<SeatNumber, Chips> = BTreeMap::new();
        for tier in &pots {
            if tier.amount == 0 {
                continue;
            }
            let best = tier
                .eligible
                .iter()
                .filter_map(|n| results.get(n))
                .max()
                .cloned();
            let winners: Vec<SeatNumber> = payout_order
                .iter()
                .copied()
                .filter(|n| tier.eligible.contains(n) && results.get(n) == best.as_ref())
                .collect();
            for (seat, share) in pot::split_pot(tier.amount, &winners) {
                *awarded.entry(seat).or_default() += share;
            }
        }

        let paid: Chips = awarded.values().sum();
        assert_eq!(paid + rake, pot_size, "pot arithmetic drifted at showdown");

        let mut winners = Vec::with_capacity(awarded.len());
        for (seat_number, amount) in awarded {
            let Some(seat) = self.seats.get_mut(&seat_number) else {
                continue;
            };
            seat.stack += amount;
            let hand = results.get(&seat_number).cloned();
            self.events.push_back(TableEvent::PotAwarded {
                seat: seat_number,
                amount,
                hand: hand.as_ref().map(|h| h.category),
            });
            winners.push(Winner {
                seat: seat_number,
                player_id: seat.player_id,
                amount,
                hand,
            });
        }
        self.hand.winners = winners;
        self.hand.pot = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::create_deck;

    fn request(player_id: PlayerId, seat_number: SeatNumber, buy_in: Chips) -> SeatRequest {
        SeatRequest {
            player_id,
            seat_number,
            display_name: format!("p{player_id}"),
            photo_url: None,
            buy_in,
        }
    }

    fn table(stacks: &[Chips]) -> TableState {
        let mut state = TableState::new(GameSettings::default());
        for (idx, &stack) in stacks.iter().enumerate() {
            state
                .add_seat(request(idx as PlayerId + 1, idx, stack))
                .unwrap();
        }
        state
    }

    #[test]
    fn test_add_seat_rejects_conflicts() {
        let mut state = table(&[100]);
        assert_eq!(
            state.add_seat(request(9, 0, 100)),
            Err(SeatError::SeatOccupied(0))
        );
        assert_eq!(
            state.add_seat(request(1, 1, 100)),
            Err(SeatError::AlreadySeated(1))
        );
        assert_eq!(
            state.add_seat(request(9, 9, 100)),
            Err(SeatError::SeatOutOfRange {
                seat: 9,
                max_seats: 9
            })
        );
        assert_eq!(state.add_seat(request(9, 4, 0)), Err(SeatError::InvalidAmount));
        assert_eq!(state.seats().len(), 1);
    }

    #[test]
    fn test_cannot_start_alone() {
        let mut state = table(&[100]);
        assert!(!state.can_start_hand());
        assert_eq!(state.start_new_hand(), Err(StartError::NotEnoughPlayers));
        assert_eq!(state.status(), HandStatus::Waiting);
    }

    #[test]
    fn test_sitting_out_seat_is_not_dealt() {
        let mut state = table(&[100, 100, 100]);
        state.set_sitting_out(2, true).unwrap();
        state.start_new_hand().unwrap();
        assert!(!state.seat(2).unwrap().in_hand);
        assert!(state.seat(2).unwrap().hole_cards.is_empty());
        assert_eq!(state.seat(0).unwrap().hole_cards.len(), 2);
    }

    #[test]
    fn test_heads_up_blinds_and_first_to_act() {
        let mut state = table(&[100, 100]);
        state.start_new_hand().unwrap();
        let hand = state.hand();
        assert_eq!(hand.dealer_seat, Some(0));
        assert_eq!(hand.small_blind_seat, Some(0));
        assert_eq!(hand.big_blind_seat, Some(1));
        assert_eq!(hand.current_turn, Some(0));
        assert_eq!(hand.pot, 3);
        assert_eq!(hand.current_bet, 2);
        assert_eq!(hand.min_raise, 2);
    }

    #[test]
    fn test_three_handed_positions() {
        let mut state = table(&[100, 100, 100]);
        state.start_new_hand().unwrap();
        let hand = state.hand();
        assert_eq!(hand.dealer_seat, Some(0));
        assert_eq!(hand.small_blind_seat, Some(1));
        assert_eq!(hand.big_blind_seat, Some(2));
        assert_eq!(hand.current_turn, Some(0));
    }

    #[test]
    fn test_button_rotates_between_hands() {
        let mut state = table(&[100, 100, 100]);
        state.start_new_hand().unwrap();
        state.handle_action(0, Action::Fold).unwrap();
        state.handle_action(1, Action::Fold).unwrap();
        assert_eq!(state.status(), HandStatus::Waiting);

        state.start_new_hand().unwrap();
        assert_eq!(state.hand().dealer_seat, Some(1));
        assert_eq!(state.hand().small_blind_seat, Some(2));
        assert_eq!(state.hand().big_blind_seat, Some(0));
        assert_eq!(state.hand().hand_number, 2);
    }

    #[test]
    fn test_out_of_turn_is_rejected_without_changes() {
        let mut state = table(&[100, 100, 100]);
        state.start_new_hand().unwrap();
        let pot = state.hand().pot;
        assert_eq!(
            state.handle_action(1, Action::Call),
            Err(ActionError::OutOfTurnAction)
        );
        assert_eq!(
            state.handle_action(7, Action::Call),
            Err(ActionError::OutOfTurnAction)
        );
        assert_eq!(state.hand().pot, pot);
        assert_eq!(state.current_turn(), Some(0));
    }

    #[test]
    fn test_check_facing_bet_is_rejected() {
        let mut state = table(&[100, 100]);
        state.start_new_hand().unwrap();
        assert_eq!(
            state.handle_action(0, Action::Check),
            Err(ActionError::CannotCheck { to_call: 1 })
        );
    }

    #[test]
    fn test_raise_validation() {
        let mut state = table(&[100, 100]);
        state.start_new_hand().unwrap();
        assert_eq!(
            state.handle_action(0, Action::Raise(1)),
            Err(ActionError::RaiseTooSmall {
                amount: 1,
                min_raise: 2
            })
        );
        assert_eq!(
            state.handle_action(0, Action::Raise(100)),
            Err(ActionError::InsufficientChips {
                needed: 101,
                stack: 99
            })
        );

        state.handle_action(0, Action::Raise(6)).unwrap();
        assert_eq!(state.hand().current_bet, 8);
        assert_eq!(state.hand().min_raise, 6);
        assert_eq!(state.hand().last_aggressor, Some(0));
        assert_eq!(state.seat(0).unwrap().bet, 8);
        assert_eq!(state.current_turn(), Some(1));
    }

    #[test]
    fn test_raise_reopens_action() {
        let mut state = table(&[100, 100, 100]);
        state.start_new_hand().unwrap();
        state.handle_action(0, Action::Call).unwrap();
        state.handle_action(1, Action::Call).unwrap();
        state.handle_action(2, Action::Raise(4)).unwrap();
        assert!(!state.seat(0).unwrap().has_acted);
        assert!(!state.seat(1).unwrap().has_acted);
        assert_eq!(state.current_turn(), Some(0));
        assert_eq!(state.status(), HandStatus::Preflop);
    }

    #[test]
    fn test_big_blind_gets_option() {
        let mut state = table(&[100, 100, 100]);
        state.start_new_hand().unwrap();
        state.handle_action(0, Action::Call).unwrap();
        state.handle_action(1, Action::Call).unwrap();
        assert_eq!(state.current_turn(), Some(2));
        state.handle_action(2, Action::Check).unwrap();
        assert_eq!(state.status(), HandStatus::Flop);
        assert_eq!(state.hand().community_cards.len(), 3);
        // First live seat after the button opens the flop.
        assert_eq!(state.current_turn(), Some(1));
    }

    #[test]
    fn test_all_in_over_bet_acts_as_raise() {
        let mut state = table(&[100, 100, 5]);
        state.start_new_hand().unwrap();
        state.handle_action(0, Action::Call).unwrap();
        state.handle_action(1, Action::Call).unwrap();
        state.handle_action(2, Action::AllIn).unwrap();
        let hand = state.hand();
        assert_eq!(hand.current_bet, 5);
        assert_eq!(hand.min_raise, 3);
        assert!(state.seat(2).unwrap().all_in);
        assert!(!state.seat(0).unwrap().has_acted);
        assert_eq!(state.current_turn(), Some(0));
    }

    #[test]
    fn test_short_all_in_acts_as_call_and_runs_out() {
        let mut state = table(&[100, 100, 10]);
        state.start_new_hand().unwrap();
        state.handle_action(0, Action::Raise(20)).unwrap();
        state.handle_action(1, Action::Fold).unwrap();
        state.handle_action(2, Action::AllIn).unwrap();
        // 10 doesn't beat the 22 bet, so nothing reopens.
        assert_eq!(state.hand().current_bet, 0);
        assert_eq!(state.status(), HandStatus::Showdown);
        assert_eq!(state.hand().community_cards.len(), 5);
        assert_eq!(state.hand().pot, 0);
        assert_eq!(state.total_chips(), 210);
        // The 12 nobody could match comes back to seat 0 at worst.
        assert!(state.seat(0).unwrap().stack >= 90);
    }

    #[test]
    fn test_street_completes_after_raise_and_call() {
        let mut state = table(&[100, 100, 100]);
        state.start_new_hand().unwrap();
        state.handle_action(0, Action::Raise(20)).unwrap();
        state.handle_action(1, Action::Call).unwrap();
        assert_eq!(state.hand().current_bet, 22);
        state.handle_action(2, Action::Fold).unwrap();
        assert_eq!(state.status(), HandStatus::Flop);
        assert_eq!(state.hand().pot, 46);
    }

    #[test]
    fn test_timeout_checks_when_free() {
        let mut state = table(&[100, 100]);
        state.start_new_hand().unwrap();
        state.handle_action(0, Action::Call).unwrap();
        assert_eq!(state.apply_timeout(), Some((1, Action::Check)));
        assert_eq!(state.status(), HandStatus::Flop);
    }

    #[test]
    fn test_timeout_folds_facing_bet() {
        let mut state = table(&[100, 100, 100]);
        state.start_new_hand().unwrap();
        assert_eq!(state.apply_timeout(), Some((0, Action::Fold)));
        assert!(state.seat(0).unwrap().folded);
        assert_eq!(state.current_turn(), Some(1));
    }

    #[test]
    fn test_remove_on_turn_folds_and_passes_turn() {
        let mut state = table(&[100, 100, 100]);
        state.start_new_hand().unwrap();
        let seat = state.remove_seat(0).unwrap();
        assert_eq!(seat.stack, 100);
        assert!(state.seat(0).is_none());
        assert_eq!(state.hand().pot, 3);
        assert_eq!(state.current_turn(), Some(1));
    }

    #[test]
    fn test_remove_mid_hand_leaves_chips_in_pot() {
        let mut state = table(&[100, 100, 100]);
        state.start_new_hand().unwrap();
        state.handle_action(0, Action::Call).unwrap();
        // Seat 0 has 2 in the pot and is not on the clock.
        let seat = state.remove_seat(0).unwrap();
        assert_eq!(seat.stack, 98);
        assert_eq!(state.hand().pot, 5);
        assert_eq!(state.current_turn(), Some(1));
        assert_eq!(state.status(), HandStatus::Preflop);
    }

    #[test]
    fn test_remove_leaving_one_player_awards_pot() {
        let mut state = table(&[100, 100]);
        state.start_new_hand().unwrap();
        let seat = state.remove_seat(0).unwrap();
        assert_eq!(seat.stack, 99);
        assert_eq!(state.status(), HandStatus::Waiting);
        assert_eq!(state.seat(1).unwrap().stack, 101);
    }

    #[test]
    fn test_rebuy_rules() {
        let mut state = table(&[100, 100]);
        state.start_new_hand().unwrap();
        assert_eq!(state.rebuy(0, 50), Err(SeatError::InHand(0)));
        assert_eq!(state.rebuy(0, 0), Err(SeatError::InvalidAmount));
        assert_eq!(state.rebuy(5, 10), Err(SeatError::EmptySeat(5)));
    }

    #[test]
    fn test_showdown_split_pot_odd_chip() {
        let settings = GameSettings {
            rake_percent: 20.0,
            rake_cap: 10,
            ..GameSettings::default()
        };
        let mut state = TableState::new(settings);
        for seat in 0..3 {
            state.add_seat(request(seat as PlayerId + 1, seat, 100)).unwrap();
        }

        // The board is a royal flush, so every live seat ties.
        let board: Vec<Card> = ["Ah", "Kh", "Qh", "Jh", "Th"]
            .iter()
            .map(|c| c.parse().unwrap())
            .collect();
        let mut cards: Vec<Card> = create_deck()
            .into_iter()
            .filter(|c| !board.contains(c))
            .take(6)
            .collect();
        cards.extend(board);
        state.start_hand_with_deck(Deck::from_cards(cards)).unwrap();

        state.handle_action(0, Action::Call).unwrap();
        state.handle_action(1, Action::Call).unwrap();
        state.handle_action(2, Action::Check).unwrap();
        assert_eq!(state.status(), HandStatus::Flop);
        state.handle_action(1, Action::Check).unwrap();
        state.handle_action(2, Action::Check).unwrap();
        state.handle_action(0, Action::Fold).unwrap();
        for _ in 0..2 {
            state.handle_action(1, Action::Check).unwrap();
            state.handle_action(2, Action::Check).unwrap();
        }
        assert_eq!(state.status(), HandStatus::Showdown);

        // Pot of 6, rake of 1, 5 split with the odd chip left of the button.
        let hand = state.hand();
        assert_eq!(hand.pot, 0);
        assert_eq!(hand.rake_collected, 1);
        assert_eq!(hand.winners.len(), 2);
        assert_eq!((hand.winners[0].seat, hand.winners[0].amount), (1, 3));
        assert_eq!((hand.winners[1].seat, hand.winners[1].amount), (2, 2));
        assert!(hand.winners.iter().all(|w| {
            w.hand.as_ref().map(|h| h.category) == Some(HandCategory::RoyalFlush)
        }));
        assert_eq!(state.seat(0).unwrap().stack, 98);
        assert_eq!(state.seat(1).unwrap().stack, 101);
        assert_eq!(state.seat(2).unwrap().stack, 100);

        assert!(state.end_hand().is_empty());
        assert_eq!(state.status(), HandStatus::Waiting);
    }

    #[test]
    fn test_busted_seat_sits_out() {
        let mut state = table(&[100, 2]);
        // Heads-up: seat 1 posts its whole stack as the big blind.
        state.start_new_hand().unwrap();
        assert!(state.seat(1).unwrap().all_in);
        state.handle_action(0, Action::Call).unwrap();
        assert_eq!(state.status(), HandStatus::Showdown);
        let loser = if state.seat(1).unwrap().stack == 0 { Some(1) } else { None };
        let busted = state.end_hand();
        assert_eq!(busted.first().copied(), loser);
        if loser.is_some() {
            assert!(state.seat(1).unwrap().sitting_out);
            assert!(!state.can_start_hand());
            state.rebuy(1, 50).unwrap();
            assert!(!state.seat(1).unwrap().sitting_out);
            assert!(state.can_start_hand());
        }
    }

    #[test]
    fn test_events_are_drained() {
        let mut state = table(&[100, 100]);
        state.drain_events();
        state.start_new_hand().unwrap();
        let events = state.drain_events();
        assert!(matches!(events.front(), Some(TableEvent::HandStarted { hand_number: 1, .. })));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, TableEvent::BlindPosted { .. }))
                .count(),
            2
        );
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_sit_in_with_no_chips_is_rejected() {
        let mut state = table(&[100, 100]);
        if let Some(seat) = state.seats.get_mut(&1) {
            seat.stack = 0;
            seat.sitting_out = true;
        }
        assert_eq!(state.set_sitting_out(1, false), Err(SeatError::NoChips(1)));
        assert!(state.seat(1).unwrap().sitting_out);

        state.rebuy(1, 20).unwrap();
        state.set_sitting_out(1, true).unwrap();
        assert_eq!(state.set_sitting_out(1, false), Ok(()));
        assert!(state.can_start_hand());
    }

    #[test]
    fn test_pot_with_no_live_seat_is_not_raked() {
        let settings = GameSettings {
            rake_percent: 50.0,
            rake_cap: 10,
            ..GameSettings::default()
        };
        let mut state = TableState::new(settings);
        for seat in 0..3 {
            state.add_seat(request(seat as PlayerId + 1, seat, 100)).unwrap();
        }
        state.start_new_hand().unwrap();
        state.handle_action(0, Action::Call).unwrap();
        let in_play = state.chips_in_play();
        state.drain_events();

        for seat in state.seats.values_mut() {
            seat.folded = true;
        }
        state.award_fold_out();

        let hand = state.hand();
        assert_eq!(hand.unclaimed, 5);
        assert_eq!(hand.rake_collected, 0);
        assert!(hand.winners.is_empty());
        assert_eq!(state.status(), HandStatus::Waiting);
        assert_eq!(state.chips_in_play(), in_play);

        let events = state.drain_events();
        assert!(events.contains(&TableEvent::PotUnclaimed(5)));
        assert!(!events.iter().any(|e| matches!(e, TableEvent::RakeCollected(_))));
    }
}
