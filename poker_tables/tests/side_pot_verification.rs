//! Side pot calculation tests, unit and property-based
//!
//! These tests verify that side pot distribution works correctly:
//! - Multiple all-ins at different amounts
//! - Folded players contribute but can't win
//! - Uncontested excess returns to the player who put it in
//! - Rake comes out of the main pot first

use poker_tables::{
    Action, HandStatus,
    game::pot::{Contribution, PotTier, build_pots, compute_rake, split_pot, take_rake},
};
use proptest::prelude::*;

mod common;
use common::{blinds, stacked_deck, table_with};

fn live(seat: usize, amount: u64) -> Contribution {
    Contribution {
        seat,
        amount,
        folded: false,
    }
}

fn folded(seat: usize, amount: u64) -> Contribution {
    Contribution {
        seat,
        amount,
        folded: true,
    }
}

#[test]
fn test_simple_side_pot_three_players() {
    // Player 0: all-in 50, players 1 and 2 put in 100.
    let pots = build_pots(&[live(0, 50), live(1, 100), live(2, 100)]);
    assert_eq!(
        pots,
        vec![
            PotTier {
                amount: 150,
                eligible: vec![0, 1, 2],
            },
            PotTier {
                amount: 100,
                eligible: vec![1, 2],
            },
        ]
    );
}

#[test]
fn test_multiple_side_pots_four_players() {
    let pots = build_pots(&[live(0, 25), live(1, 75), live(2, 150), live(3, 150)]);
    let amounts: Vec<u64> = pots.iter().map(|p| p.amount).collect();
    assert_eq!(amounts, vec![100, 150, 150]);
    assert_eq!(pots[2].eligible, vec![2, 3]);
}

#[test]
fn test_folded_money_stays_but_cannot_win() {
    // Seat 1 folded after putting in 60.
    let pots = build_pots(&[live(0, 50), folded(1, 60), live(2, 100)]);
    assert_eq!(pots[0].amount, 150);
    assert_eq!(pots[0].eligible, vec![0, 2]);
    // Above 50 only seat 2 is live: its excess plus the folded 10.
    assert_eq!(pots[1].amount, 60);
    assert_eq!(pots[1].eligible, vec![2]);
}

#[test]
fn test_rake_from_main_pot_first() {
    let mut pots = vec![
        PotTier {
            amount: 4,
            eligible: vec![0, 1, 2],
        },
        PotTier {
            amount: 100,
            eligible: vec![1, 2],
        },
    ];
    let rake = compute_rake(104, 10.0, 6);
    assert_eq!(rake, 6);
    assert_eq!(take_rake(&mut pots, rake), 6);
    assert_eq!(pots[0].amount, 0);
    assert_eq!(pots[1].amount, 98);
}

#[test]
fn test_odd_chip_goes_left_of_button() {
    assert_eq!(split_pot(7, &[3, 1]), vec![(3, 4), (1, 3)]);
    assert_eq!(split_pot(9, &[0, 1, 2]), vec![(0, 3), (1, 3), (2, 3)]);
}

#[test]
fn test_short_all_in_wins_only_main_pot() {
    // Dealer is seat 0, so cards go out to seats 1, 2, 0 twice.
    // Seat 0: aces, seat 1: kings, seat 2: queens. The board is dry.
    let deck = stacked_deck("Kh Qh Ah Kd Qd Ad 2c 7d 9h 3s 5c");
    let mut state = table_with(blinds(1, 2), &[50, 100, 100]);
    state.start_hand_with_deck(deck).unwrap();

    state.handle_action(0, Action::AllIn).unwrap();
    state.handle_action(1, Action::AllIn).unwrap();
    state.handle_action(2, Action::Call).unwrap();

    assert_eq!(state.status(), HandStatus::Showdown);
    assert_eq!(state.hand().community_cards.len(), 5);
    assert_eq!(state.hand().pot, 0);

    let winners: Vec<(usize, u64)> = state
        .hand()
        .winners
        .iter()
        .map(|w| (w.seat, w.amount))
        .collect();
    assert!(winners.contains(&(0, 150)));
    assert!(winners.contains(&(1, 100)));
    assert_eq!(state.seat(0).unwrap().stack, 150);
    assert_eq!(state.seat(1).unwrap().stack, 100);
    assert_eq!(state.seat(2).unwrap().stack, 0);

    assert_eq!(state.end_hand(), vec![2]);
    assert!(state.seat(2).unwrap().sitting_out);
}

fn contributions_strategy() -> impl Strategy<Value = Vec<Contribution>> {
    prop::collection::vec((1u64..500, any::<bool>()), 2..=9).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(seat, (amount, is_folded))| Contribution {
                seat,
                amount,
                folded: is_folded,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn test_pots_hold_every_chip(contributions in contributions_strategy()) {
        let pots = build_pots(&contributions);
        let total: u64 = contributions.iter().map(|c| c.amount).sum();
        prop_assert_eq!(pots.iter().map(|p| p.amount).sum::<u64>(), total);
    }

    #[test]
    fn test_folded_seats_never_eligible(contributions in contributions_strategy()) {
        for pot in build_pots(&contributions) {
            for seat in &pot.eligible {
                prop_assert!(!contributions[*seat].folded);
            }
        }
    }

    #[test]
    fn test_eligibility_shrinks(contributions in contributions_strategy()) {
        let pots = build_pots(&contributions);
        for pair in pots.windows(2) {
            prop_assert!(pair[1].eligible.iter().all(|s| pair[0].eligible.contains(s)));
        }
    }

    #[test]
    fn test_split_pays_everything(amount in 0u64..10_000, winners in 1usize..9) {
        let seats: Vec<usize> = (0..winners).collect();
        let shares = split_pot(amount, &seats);
        prop_assert_eq!(shares.iter().map(|(_, s)| s).sum::<u64>(), amount);
        let max = shares.iter().map(|(_, s)| *s).max().unwrap();
        let min = shares.iter().map(|(_, s)| *s).min().unwrap();
        prop_assert!(max - min <= 1);
    }
}
