//! Pot tiers, rake and split arithmetic used at settlement.

use serde::{Deserialize, Serialize};

use super::entities::{Chips, SeatNumber};

/// What one seat put into the pot over a hand.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Contribution {
    pub seat: SeatNumber,
    pub amount: Chips,
    pub folded: bool,
}

/// A main or side pot and the seats that can win it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PotTier {
    pub amount: Chips,
    pub eligible: Vec<SeatNumber>,
}

/// Splits contributions into tiers, main pot first.
///
/// A tier is cut at every distinct contribution level among seats still
/// holding cards. Folded seats pay into every tier they reached but are
/// never eligible; anything they put in above the highest live level is
/// added to the last tier. Tiers with the same eligible seats are merged.
#[must_use]
pub fn build_pots(contributions: &[Contribution]) -> Vec<PotTier> {
    let mut levels: Vec<Chips> = contributions
        .iter()
        .filter(|c| !c.folded && c.amount > 0)
        .map(|c| c.amount)
        .collect();
    levels.sort_unstable();
    levels.dedup();

    let mut pots: Vec<PotTier> = Vec::with_capacity(levels.len());
    let mut prev_level = 0;
    for level in levels {
        let amount: Chips = contributions
            .iter()
            .map(|c| c.amount.min(level) - c.amount.min(prev_level))
            .sum();
        let eligible: Vec<SeatNumber> = contributions
            .iter()
            .filter(|c| !c.folded && c.amount >= level)
            .map(|c| c.seat)
            .collect();

        match pots.last_mut() {
            Some(last) if last.eligible == eligible => last.amount += amount,
            _ => pots.push(PotTier { amount, eligible }),
        }
        prev_level = level;
    }

    let dead: Chips = contributions
        .iter()
        .map(|c| c.amount.saturating_sub(prev_level))
        .sum();
    if dead > 0 {
        match pots.last_mut() {
            Some(last) => last.amount += dead,
            None => pots.push(PotTier {
                amount: dead,
                eligible: Vec::new(),
            }),
        }
    }

    pots
}

/// House cut of a pot: `floor(pot * percent / 100)`, never more than `cap`.
#[must_use]
pub fn compute_rake(pot: Chips, percent: f64, cap: Chips) -> Chips {
    if pot == 0 || percent <= 0.0 {
        return 0;
    }
    let raw = (pot as f64 * percent / 100.0).floor() as Chips;
    raw.min(cap).min(pot)
}

/// Takes `rake` out of the tiers, main pot first. Returns what was taken.
pub fn take_rake(pots: &mut [PotTier], rake: Chips) -> Chips {
    let mut remaining = rake;
    for pot in pots.iter_mut() {
        let taken = remaining.min(pot.amount);
        pot.amount -= taken;
        remaining -= taken;
        if remaining == 0 {
            break;
        }
    }
    rake - remaining
}

/// Divides `amount` evenly among `winners`, which must already be in
/// payout order. Odd chips go one each to the earliest winners.
#[must_use]
pub fn split_pot(amount: Chips, winners: &[SeatNumber]) -> Vec<(SeatNumber, Chips)> {
    if winners.is_empty() {
        return Vec::new();
    }
    let count = winners.len() as Chips;
    let share = amount / count;
    let odd = (amount % count) as usize;
    winners
        .iter()
        .enumerate()
        .map(|(idx, &seat)| (seat, share + Chips::from(idx < odd)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(seat: SeatNumber, amount: Chips) -> Contribution {
        Contribution {
            seat,
            amount,
            folded: false,
        }
    }

    fn folded(seat: SeatNumber, amount: Chips) -> Contribution {
        Contribution {
            seat,
            amount,
            folded: true,
        }
    }

    #[test]
    fn test_single_pot_when_everyone_matches() {
        let pots = build_pots(&[live(0, 50), live(1, 50), live(2, 50)]);
        assert_eq!(
            pots,
            vec![PotTier {
                amount: 150,
                eligible: vec![0, 1, 2]
            }]
        );
    }

    #[test]
    fn test_short_all_in_creates_side_pot() {
        let pots = build_pots(&[live(0, 30), live(1, 100), live(2, 100)]);
        assert_eq!(pots.len(), 2);
        assert_eq!(pots[0].amount, 90);
        assert_eq!(pots[0].eligible, vec![0, 1, 2]);
        assert_eq!(pots[1].amount, 140);
        assert_eq!(pots[1].eligible, vec![1, 2]);
    }

    #[test]
    fn test_uncalled_excess_is_its_own_tier() {
        let pots = build_pots(&[live(0, 40), live(1, 100)]);
        assert_eq!(pots[0].amount, 80);
        assert_eq!(pots[1].amount, 60);
        assert_eq!(pots[1].eligible, vec![1]);
    }

    #[test]
    fn test_folded_chips_are_dead_money() {
        let pots = build_pots(&[folded(0, 20), live(1, 10), live(2, 50)]);
        // Tier at 10: 10 from each seat.
        assert_eq!(pots[0].amount, 30);
        assert_eq!(pots[0].eligible, vec![1, 2]);
        // Tier 10..50: 10 more from the folder plus 40 from seat 2.
        assert_eq!(pots[1].amount, 50);
        assert_eq!(pots[1].eligible, vec![2]);
    }

    #[test]
    fn test_folded_above_every_live_level() {
        let pots = build_pots(&[folded(0, 80), live(1, 20), live(2, 20)]);
        assert_eq!(
            pots,
            vec![PotTier {
                amount: 120,
                eligible: vec![1, 2]
            }]
        );
    }

    #[test]
    fn test_pots_conserve_chips() {
        let contributions = [live(0, 7), folded(1, 3), live(2, 19), live(3, 19), folded(4, 25)];
        let total: Chips = contributions.iter().map(|c| c.amount).sum();
        let pots = build_pots(&contributions);
        assert_eq!(pots.iter().map(|p| p.amount).sum::<Chips>(), total);
    }

    #[test]
    fn test_compute_rake_caps() {
        assert_eq!(compute_rake(100, 5.0, 10), 5);
        assert_eq!(compute_rake(1000, 5.0, 10), 10);
        assert_eq!(compute_rake(39, 5.0, 10), 1);
        assert_eq!(compute_rake(19, 5.0, 10), 0);
        assert_eq!(compute_rake(100, 0.0, 10), 0);
        assert_eq!(compute_rake(100, 100.0, 500), 100);
    }

    #[test]
    fn test_take_rake_from_main_pot_first() {
        let mut pots = vec![
            PotTier {
                amount: 3,
                eligible: vec![0, 1],
            },
            PotTier {
                amount: 10,
                eligible: vec![1],
            },
        ];
        assert_eq!(take_rake(&mut pots, 5), 5);
        assert_eq!(pots[0].amount, 0);
        assert_eq!(pots[1].amount, 8);
    }

    #[test]
    fn test_split_pot_odd_chips_go_first() {
        assert_eq!(split_pot(10, &[4, 1, 2]), vec![(4, 4), (1, 3), (2, 3)]);
        assert_eq!(split_pot(9, &[0, 5]), vec![(0, 5), (5, 4)]);
        assert!(split_pot(9, &[]).is_empty());
    }
}
