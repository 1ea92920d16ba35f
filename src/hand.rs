use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::cards::{Card, Rank};
use crate::error::{SimError, SimResult};

pub const HAND_SIZE: usize = 5;

/// The ten hand categories, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum HandCategory {
    HighCard = 0,
    Pair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
    RoyalFlush = 9,
}

impl HandCategory {
    pub const COUNT: usize = 10;

    pub const ALL: [HandCategory; Self::COUNT] = [
        HandCategory::HighCard,
        HandCategory::Pair,
        HandCategory::TwoPair,
        HandCategory::ThreeOfAKind,
        HandCategory::Straight,
        HandCategory::Flush,
        HandCategory::FullHouse,
        HandCategory::FourOfAKind,
        HandCategory::StraightFlush,
        HandCategory::RoyalFlush,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            HandCategory::HighCard => "high card",
            HandCategory::Pair => "pair",
            HandCategory::TwoPair => "two pair",
            HandCategory::ThreeOfAKind => "three of a kind",
            HandCategory::Straight => "straight",
            HandCategory::Flush => "flush",
            HandCategory::FullHouse => "full house",
            HandCategory::FourOfAKind => "four of a kind",
            HandCategory::StraightFlush => "straight flush",
            HandCategory::RoyalFlush => "royal flush",
        }
    }
}

impl Display for HandCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Category plus the tie-break key used within that category.
///
/// The key lists grouped values before kickers, each run descending, padded
/// with zeroes. Ordering compares the category, then the key lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HandClassification {
    pub category: HandCategory,
    pub tiebreak: [u8; HAND_SIZE],
}

impl HandClassification {
    pub fn rank_value(&self) -> u8 {
        self.category.value()
    }
}

impl PartialOrd for HandClassification {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandClassification {
    fn cmp(&self, other: &Self) -> Ordering {
        self.category
            .cmp(&other.category)
            .then_with(|| self.tiebreak.cmp(&other.tiebreak))
    }
}

fn fill(values: &[u8]) -> [u8; HAND_SIZE] {
    let mut key = [0u8; HAND_SIZE];
    for (slot, value) in key.iter_mut().zip(values) {
        *slot = *value;
    }
    key
}

/// Returns `InvalidHandSize` unless `cards` holds exactly five cards.
pub fn ensure_hand_size(cards: &[Card]) -> SimResult<()> {
    if cards.len() == HAND_SIZE {
        Ok(())
    } else {
        Err(SimError::InvalidHandSize { found: cards.len() })
    }
}

/// Highest card of a five-value straight, with A-2-3-4-5 reported as 5.
fn straight_high(counts: &[u8; 15]) -> Option<u8> {
    if counts.iter().any(|&count| count > 1) {
        return None;
    }
    let present = |value: u8| counts[value as usize] == 1;
    for high in (6u8..=14).rev() {
        if (0..5).all(|i| present(high - i)) {
            return Some(high);
        }
    }
    let wheel = [Rank::Ace.value(), 2, 3, 4, 5];
    wheel.iter().all(|&v| present(v)).then_some(5)
}

/// Classifies a five-card hand.
pub fn classify(cards: &[Card]) -> SimResult<HandClassification> {
    ensure_hand_size(cards)?;

    let mut counts = [0u8; 15];
    for card in cards {
        counts[card.value() as usize] += 1;
    }
    let first_suit = cards[0].suit;
    let is_flush = cards.iter().all(|card| card.suit == first_suit);
    let straight = straight_high(&counts);

    // (count, value), largest groups first and higher values first within a size.
    let mut groups: Vec<(u8, u8)> = (2u8..=14)
        .filter(|&value| counts[value as usize] > 0)
        .map(|value| (counts[value as usize], value))
        .collect();
    groups.sort_unstable_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
    let grouped: Vec<u8> = groups.iter().map(|&(_, value)| value).collect();
    let shape: Vec<u8> = groups.iter().map(|&(count, _)| count).collect();

    let run_key = |high: u8| {
        if high == 5 {
            [5, 4, 3, 2, 1]
        } else {
            [high, high - 1, high - 2, high - 3, high - 4]
        }
    };
    let made = |category, tiebreak| Ok(HandClassification { category, tiebreak });

    if is_flush && let Some(high) = straight {
        // Royal flush is checked ahead of the generic straight flush.
        if high == Rank::Ace.value() {
            return made(HandCategory::RoyalFlush, run_key(high));
        }
        return made(HandCategory::StraightFlush, run_key(high));
    }

    match shape.as_slice() {
        [4, 1] => return made(HandCategory::FourOfAKind, fill(&grouped)),
        [3, 2] => return made(HandCategory::FullHouse, fill(&grouped)),
        _ => {}
    }

    if is_flush {
        return made(HandCategory::Flush, fill(&grouped));
    }
    if let Some(high) = straight {
        return made(HandCategory::Straight, run_key(high));
    }

    let category = match shape.as_slice() {
        [3, 1, 1] => HandCategory::ThreeOfAKind,
        [2, 2, 1] => HandCategory::TwoPair,
        [2, 1, 1, 1] => HandCategory::Pair,
        _ => HandCategory::HighCard,
    };
    made(category, fill(&grouped))
}

pub fn compare(a: &HandClassification, b: &HandClassification) -> Ordering {
    a.cmp(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;

    fn classified(s: &str) -> HandClassification {
        classify(&parse_cards(s).unwrap()).unwrap()
    }

    #[test]
    fn royal_flush_beats_straight_flush() {
        let royal = classified("As Ks Qs Js Ts");
        let straight_flush = classified("9h 8h 7h 6h 5h");
        assert_eq!(royal.category, HandCategory::RoyalFlush);
        assert_eq!(straight_flush.category, HandCategory::StraightFlush);
        assert!(royal > straight_flush);
    }

    #[test]
    fn wheel_ranks_below_six_high_straight() {
        let wheel = classified("Ac 2d 3h 4s 5c");
        let six_high = classified("6c 5d 4h 3s 2c");
        assert_eq!(wheel.category, HandCategory::Straight);
        assert_eq!(wheel.tiebreak, [5, 4, 3, 2, 1]);
        assert!(wheel < six_high);
    }

    #[test]
    fn steel_wheel_is_a_straight_flush_not_royal() {
        let hand = classified("Ad 2d 3d 4d 5d");
        assert_eq!(hand.category, HandCategory::StraightFlush);
    }

    #[test]
    fn grouped_values_precede_kickers() {
        let full_house = classified("3c 3d 3h Ks Kc");
        assert_eq!(full_house.tiebreak, [3, 13, 0, 0, 0]);
        let two_pair = classified("9c 9d 4h 4s Ac");
        assert_eq!(two_pair.tiebreak, [9, 4, 14, 0, 0]);
        let pair = classified("2c 2d Ah Ks 7c");
        assert_eq!(pair.tiebreak, [2, 14, 13, 7, 0]);
        assert!(classified("3c 3d 2h 4s 5c") > pair);
    }

    #[test]
    fn rejects_wrong_hand_size() {
        let four = parse_cards("As Ks Qs Js").unwrap();
        assert_eq!(classify(&four), Err(SimError::InvalidHandSize { found: 4 }));
        let six = parse_cards("As Ks Qs Js Ts 9s").unwrap();
        assert_eq!(classify(&six), Err(SimError::InvalidHandSize { found: 6 }));
    }
}
