//! Hand ranking. Everything here is a pure function of the cards given.

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

use super::entities::{ACE, Card, Value};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandCategory {
    HighCard,
    Pair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl HandCategory {
    /// Numeric category, 0 for high card through 9 for a royal flush.
    #[must_use]
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::Pair => "pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
            Self::RoyalFlush => "royal flush",
        };
        write!(f, "{repr}")
    }
}

/// A scored five-card hand. Field order matters: the derived `Ord`
/// compares the category first and then the kickers lexicographically.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HandResult {
    pub category: HandCategory,
    /// Ranks that break ties within the category, most significant first.
    pub kickers: Vec<Value>,
}

impl fmt::Display for HandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.category, self.kickers)
    }
}

/// Best hand that can be made from the hole cards plus the board.
///
/// Every five-card subset is scored, so at least five cards are needed
/// in total; asking for fewer is a caller bug and panics.
#[must_use]
pub fn evaluate(hole_cards: &[Card], community_cards: &[Card]) -> HandResult {
    let cards: Vec<Card> = hole_cards
        .iter()
        .chain(community_cards)
        .copied()
        .collect();
    assert!(
        cards.len() >= 5,
        "need at least five cards to evaluate a hand, got {}",
        cards.len()
    );

    let n = cards.len();
    let mut best: Option<HandResult> = None;
    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                for d in c + 1..n {
                    for e in d + 1..n {
                        let hand = evaluate_five(&[cards[a], cards[b], cards[c], cards[d], cards[e]]);
                        if best.as_ref().is_none_or(|current| hand > *current) {
                            best = Some(hand);
                        }
                    }
                }
            }
        }
    }
    best.unwrap_or_else(|| unreachable!("at least one five-card subset exists"))
}

/// Scores exactly five cards.
#[must_use]
pub fn evaluate_five(cards: &[Card; 5]) -> HandResult {
    let mut ranks: Vec<Value> = cards.iter().map(|c| c.rank).collect();
    ranks.sort_unstable_by(|a, b| b.cmp(a));

    let is_flush = cards.iter().all(|c| c.suit == cards[0].suit);
    let straight_high = straight_high(&ranks);

    if is_flush && let Some(high) = straight_high {
        return if high == ACE {
            HandResult {
                category: HandCategory::RoyalFlush,
                kickers: vec![ACE],
            }
        } else {
            HandResult {
                category: HandCategory::StraightFlush,
                kickers: vec![high],
            }
        };
    }

    // (count, rank), biggest groups first and higher ranks first within a size.
    let mut groups: Vec<(usize, Value)> = Vec::with_capacity(5);
    for &rank in &ranks {
        match groups.iter_mut().find(|(_, r)| *r == rank) {
            Some(group) => group.0 += 1,
            None => groups.push((1, rank)),
        }
    }
    groups.sort_unstable_by(|a, b| b.cmp(a));
    let grouped: Vec<Value> = groups.iter().map(|&(_, rank)| rank).collect();

    let category = match (groups[0].0, groups.get(1).map(|g| g.0)) {
        (4, _) => HandCategory::FourOfAKind,
        (3, Some(2)) => HandCategory::FullHouse,
        _ if is_flush => {
            return HandResult {
                category: HandCategory::Flush,
                kickers: ranks,
            };
        }
        _ if straight_high.is_some() => {
            return HandResult {
                category: HandCategory::Straight,
                kickers: straight_high.into_iter().collect(),
            };
        }
        (3, _) => HandCategory::ThreeOfAKind,
        (2, Some(2)) => HandCategory::TwoPair,
        (2, _) => HandCategory::Pair,
        _ => HandCategory::HighCard,
    };

    HandResult {
        category,
        kickers: grouped,
    }
}

/// High card of a straight in descending `ranks`, with the wheel
/// (A-2-3-4-5) counting as five-high.
fn straight_high(ranks: &[Value]) -> Option<Value> {
    let distinct = ranks.windows(2).all(|w| w[0] != w[1]);
    if !distinct {
        return None;
    }
    if ranks[0] - ranks[4] == 4 {
        Some(ranks[0])
    } else if ranks == [ACE, 5, 4, 3, 2].as_slice() {
        Some(5)
    } else {
        None
    }
}

/// Orders two results, category first and then kickers.
#[must_use]
pub fn compare(a: &HandResult, b: &HandResult) -> Ordering {
    a.cmp(b)
}

/// Indices of every hand tied for best.
#[must_use]
pub fn argmax(hands: &[HandResult]) -> Vec<usize> {
    let Some(best) = hands.iter().max() else {
        return Vec::new();
    };
    hands
        .iter()
        .enumerate()
        .filter(|(_, hand)| *hand == best)
        .map(|(idx, _)| idx)
        .collect()
}
