//! Hold/draw decisions for the player and dealer seats.
//!
//! Each seat uses a [`RuleTable`]: an ordered list of rules tested from the
//! highest priority down, where the first rule that matches decides the hold.
//! Both tables end in a rule that always matches. The order is part of the
//! game's behaviour; reordering rules changes simulated outcomes.

use itertools::Itertools;
use serde::Serialize;

use crate::cards::{Card, Rank};
use crate::error::SimResult;
use crate::hand::{HAND_SIZE, HandCategory, HandClassification, classify};

/// Coarse bucket by number of cards held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldCategory {
    Hold5,
    Hold4,
    Hold3,
    Hold2,
    Hold1,
    Hold0,
}

/// The chosen hold for one hand in one round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub id: &'static str,
    pub category: HoldCategory,
    pub description: &'static str,
    /// Positions (0..5) to keep, ascending.
    pub hold: Vec<usize>,
    pub expected_value: f64,
    pub bust_potential: bool,
}

impl Decision {
    pub fn draw_count(&self) -> usize {
        HAND_SIZE - self.hold.len()
    }

    pub fn holds(&self, position: usize) -> bool {
        self.hold.contains(&position)
    }
}

/// Static metadata of one rule, as exposed to reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleInfo {
    pub id: &'static str,
    pub category: HoldCategory,
    pub description: &'static str,
    pub expected_value: f64,
    pub bust_potential: bool,
}

type Matcher = fn(&HandView<'_>) -> Option<Vec<usize>>;

struct Rule {
    id: &'static str,
    category: HoldCategory,
    description: &'static str,
    expected_value: f64,
    bust_potential: bool,
    matcher: Matcher,
}

impl Rule {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            id: self.id,
            category: self.category,
            description: self.description,
            expected_value: self.expected_value,
            bust_potential: self.bust_potential,
        }
    }
}

/// An ordered, first-match-wins list of hold rules.
pub struct RuleTable {
    rules: &'static [Rule],
}

impl RuleTable {
    pub fn decide(&self, cards: &[Card]) -> SimResult<Decision> {
        let class = classify(cards)?;
        Ok(self.decide_classified(cards, class))
    }

    /// Same as [`RuleTable::decide`] for a hand that was already classified.
    /// `cards` must hold exactly five cards.
    pub fn decide_classified(&self, cards: &[Card], class: HandClassification) -> Decision {
        let view = HandView { cards, class };
        for rule in self.rules {
            if let Some(mut hold) = (rule.matcher)(&view) {
                hold.sort_unstable();
                return Decision {
                    id: rule.id,
                    category: rule.category,
                    description: rule.description,
                    hold,
                    expected_value: rule.expected_value,
                    bust_potential: rule.bust_potential,
                };
            }
        }
        unreachable!("rule tables end in a catch-all rule")
    }

    pub fn rules(&self) -> impl Iterator<Item = RuleInfo> + '_ {
        self.rules.iter().map(Rule::info)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub static PLAYER: RuleTable = RuleTable {
    rules: &PLAYER_RULES,
};

pub static DEALER: RuleTable = RuleTable {
    rules: &DEALER_RULES,
};

/// Decision used when the dealer is not allowed to draw.
pub fn dealer_stand() -> Decision {
    Decision {
        id: "D.STAND",
        category: HoldCategory::Hold5,
        description: "Dealer stands on the dealt hand",
        hold: (0..HAND_SIZE).collect(),
        expected_value: 0.0,
        bust_potential: false,
    }
}

pub fn player_decision(cards: &[Card]) -> SimResult<Decision> {
    PLAYER.decide(cards)
}

pub fn dealer_decision(cards: &[Card]) -> SimResult<Decision> {
    DEALER.decide(cards)
}

static PLAYER_RULES: [Rule; 17] = [
    Rule {
        id: "H5.RF",
        category: HoldCategory::Hold5,
        description: "Royal flush: hold all five",
        expected_value: 4.00,
        bust_potential: false,
        matcher: made_royal_flush,
    },
    Rule {
        id: "H5.SF",
        category: HoldCategory::Hold5,
        description: "Straight flush: hold all five",
        expected_value: 3.20,
        bust_potential: false,
        matcher: made_straight_flush,
    },
    Rule {
        id: "H5.4K",
        category: HoldCategory::Hold5,
        description: "Four of a kind: hold all five",
        expected_value: 2.50,
        bust_potential: false,
        matcher: made_four_of_a_kind,
    },
    Rule {
        id: "H5.FH",
        category: HoldCategory::Hold5,
        description: "Full house: hold all five",
        expected_value: 1.90,
        bust_potential: false,
        matcher: made_full_house,
    },
    Rule {
        id: "H5.FL",
        category: HoldCategory::Hold5,
        description: "Flush: hold all five",
        expected_value: 1.50,
        bust_potential: false,
        matcher: made_flush,
    },
    Rule {
        id: "H5.ST",
        category: HoldCategory::Hold5,
        description: "Straight: hold all five",
        expected_value: 1.20,
        bust_potential: false,
        matcher: made_straight,
    },
    Rule {
        id: "H4.SFD",
        category: HoldCategory::Hold4,
        description: "Four to a straight flush",
        expected_value: 0.62,
        bust_potential: true,
        matcher: four_to_straight_flush,
    },
    Rule {
        id: "H4.FD",
        category: HoldCategory::Hold4,
        description: "Four to a flush",
        expected_value: 0.38,
        bust_potential: true,
        matcher: four_to_flush,
    },
    Rule {
        id: "H4.OESD",
        category: HoldCategory::Hold4,
        description: "Open-ended four to a straight",
        expected_value: 0.26,
        bust_potential: true,
        matcher: open_ended_straight_draw,
    },
    Rule {
        id: "H3.TK",
        category: HoldCategory::Hold3,
        description: "Three of a kind: hold the trips",
        expected_value: 0.74,
        bust_potential: true,
        matcher: trips,
    },
    Rule {
        id: "H3.RFD",
        category: HoldCategory::Hold3,
        description: "Three to a royal flush",
        expected_value: 0.21,
        bust_potential: true,
        matcher: three_to_royal,
    },
    Rule {
        id: "H3.SFD",
        category: HoldCategory::Hold3,
        description: "Three to a straight flush",
        expected_value: 0.12,
        bust_potential: true,
        matcher: three_to_straight_flush,
    },
    Rule {
        id: "H4.TP",
        category: HoldCategory::Hold4,
        description: "Two pair: hold both pairs",
        expected_value: 0.48,
        bust_potential: true,
        matcher: two_pair,
    },
    Rule {
        id: "H2.PR",
        category: HoldCategory::Hold2,
        description: "One pair: hold the pair",
        expected_value: 0.05,
        bust_potential: true,
        matcher: one_pair,
    },
    Rule {
        id: "H2.SHC",
        category: HoldCategory::Hold2,
        description: "Two suited jack-or-better cards",
        expected_value: -0.18,
        bust_potential: true,
        matcher: suited_high_cards,
    },
    Rule {
        id: "H1.AK",
        category: HoldCategory::Hold1,
        description: "Lone ace or king",
        expected_value: -0.31,
        bust_potential: true,
        matcher: lone_ace_or_king,
    },
    Rule {
        id: "H0.ALL",
        category: HoldCategory::Hold0,
        description: "Hold nothing, draw five",
        expected_value: -0.42,
        bust_potential: true,
        matcher: hold_nothing,
    },
];

static DEALER_RULES: [Rule; 4] = [
    Rule {
        id: "D.PAIR+",
        category: HoldCategory::Hold2,
        description: "Pair or better: hold the made cards",
        expected_value: 0.0,
        bust_potential: false,
        matcher: dealer_pair_or_better,
    },
    Rule {
        id: "D.FD4",
        category: HoldCategory::Hold4,
        description: "Four to a flush",
        expected_value: 0.0,
        bust_potential: false,
        matcher: four_to_flush,
    },
    Rule {
        id: "D.SD4",
        category: HoldCategory::Hold4,
        description: "Four to a straight",
        expected_value: 0.0,
        bust_potential: false,
        matcher: dealer_straight_draw,
    },
    Rule {
        id: "D.HI2",
        category: HoldCategory::Hold2,
        description: "Hold the two highest cards",
        expected_value: 0.0,
        bust_potential: false,
        matcher: two_highest,
    },
];

struct HandView<'a> {
    cards: &'a [Card],
    class: HandClassification,
}

impl HandView<'_> {
    fn is(&self, category: HandCategory) -> bool {
        self.class.category == category
    }

    fn all(&self) -> Vec<usize> {
        (0..self.cards.len()).collect()
    }

    fn positions_of(&self, value: u8) -> Vec<usize> {
        self.cards
            .iter()
            .positions(|card| card.value() == value)
            .collect()
    }

    /// Every `size`-card subset of positions, in lexicographic order.
    fn subsets(&self, size: usize) -> impl Iterator<Item = Vec<usize>> + '_ {
        (0..self.cards.len()).combinations(size)
    }

    fn sorted_values(&self, positions: &[usize]) -> Vec<u8> {
        positions
            .iter()
            .map(|&p| self.cards[p].value())
            .sorted_unstable()
            .collect()
    }

    fn suited(&self, positions: &[usize]) -> bool {
        positions
            .iter()
            .map(|&p| self.cards[p].suit)
            .all_equal()
    }

    fn hold_all_if(&self, category: HandCategory) -> Option<Vec<usize>> {
        self.is(category).then(|| self.all())
    }
}

/// Ascending values where every step is 1, except at most one step of 2.
fn gapped_run(values: &[u8]) -> bool {
    let steps: Vec<u8> = values.windows(2).map(|w| w[1].wrapping_sub(w[0])).collect();
    steps.iter().all(|&step| step == 1 || step == 2)
        && steps.iter().filter(|&&step| step == 2).count() <= 1
}

fn consecutive(values: &[u8]) -> bool {
    values.windows(2).all(|w| w[1] == w[0] + 1)
}

fn made_royal_flush(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.hold_all_if(HandCategory::RoyalFlush)
}

fn made_straight_flush(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.hold_all_if(HandCategory::StraightFlush)
}

fn made_four_of_a_kind(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.hold_all_if(HandCategory::FourOfAKind)
}

fn made_full_house(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.hold_all_if(HandCategory::FullHouse)
}

fn made_flush(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.hold_all_if(HandCategory::Flush)
}

fn made_straight(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.hold_all_if(HandCategory::Straight)
}

fn four_to_straight_flush(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.subsets(4)
        .find(|p| hand.suited(p) && gapped_run(&hand.sorted_values(p)))
}

fn four_to_flush(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.subsets(4).find(|p| hand.suited(p))
}

/// Four consecutive values that can be completed at both ends.
fn open_ended_straight_draw(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.subsets(4).find(|p| {
        let values = hand.sorted_values(p);
        consecutive(&values) && values[0] > 2 && values[3] < Rank::Ace.value()
    })
}

fn trips(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.is(HandCategory::ThreeOfAKind)
        .then(|| hand.positions_of(hand.class.tiebreak[0]))
}

fn three_to_royal(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.subsets(3).find(|p| {
        hand.suited(p) && p.iter().all(|&i| hand.cards[i].value() >= Rank::Ten.value())
    })
}

fn three_to_straight_flush(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.subsets(3).find(|p| {
        let values = hand.sorted_values(p);
        hand.suited(p) && values[2] - values[0] <= 4
    })
}

fn two_pair(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.is(HandCategory::TwoPair).then(|| {
        let mut hold = hand.positions_of(hand.class.tiebreak[0]);
        hold.extend(hand.positions_of(hand.class.tiebreak[1]));
        hold
    })
}

fn one_pair(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.is(HandCategory::Pair)
        .then(|| hand.positions_of(hand.class.tiebreak[0]))
}

fn suited_high_cards(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.subsets(2).find(|p| {
        hand.suited(p) && p.iter().all(|&i| hand.cards[i].value() >= Rank::Jack.value())
    })
}

fn lone_ace_or_king(hand: &HandView<'_>) -> Option<Vec<usize>> {
    if !hand.is(HandCategory::HighCard) {
        return None;
    }
    [Rank::Ace, Rank::King]
        .into_iter()
        .find_map(|rank| hand.cards.iter().position(|card| card.rank == rank))
        .map(|position| vec![position])
}

fn hold_nothing(_: &HandView<'_>) -> Option<Vec<usize>> {
    Some(Vec::new())
}

fn dealer_pair_or_better(hand: &HandView<'_>) -> Option<Vec<usize>> {
    let key = hand.class.tiebreak;
    match hand.class.category {
        HandCategory::HighCard => None,
        HandCategory::Pair | HandCategory::ThreeOfAKind | HandCategory::FourOfAKind => {
            Some(hand.positions_of(key[0]))
        }
        HandCategory::TwoPair => {
            let mut hold = hand.positions_of(key[0]);
            hold.extend(hand.positions_of(key[1]));
            Some(hold)
        }
        _ => Some(hand.all()),
    }
}

/// Four distinct values spanning at most four ranks, inside draws included.
fn dealer_straight_draw(hand: &HandView<'_>) -> Option<Vec<usize>> {
    hand.subsets(4).find(|p| {
        let values = hand.sorted_values(p);
        values.iter().all_unique() && values[3] - values[0] <= 4
    })
}

/// The two highest cards; equal values keep their dealt order.
fn two_highest(hand: &HandView<'_>) -> Option<Vec<usize>> {
    let hold = (0..hand.cards.len())
        .sorted_by(|&a, &b| hand.cards[b].value().cmp(&hand.cards[a].value()))
        .take(2)
        .collect();
    Some(hold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;

    fn player(s: &str) -> Decision {
        player_decision(&parse_cards(s).unwrap()).unwrap()
    }

    fn dealer(s: &str) -> Decision {
        dealer_decision(&parse_cards(s).unwrap()).unwrap()
    }

    #[test]
    fn gapped_run_allows_a_single_two_step() {
        assert!(gapped_run(&[5, 6, 7, 8]));
        assert!(gapped_run(&[5, 6, 8, 9]));
        assert!(!gapped_run(&[5, 7, 9, 10]));
        assert!(!gapped_run(&[5, 6, 7, 10]));
    }

    #[test]
    fn straight_flush_draw_outranks_flush_draw() {
        let decision = player("9h Th Jh Qh 2c");
        assert_eq!(decision.id, "H4.SFD");
        assert_eq!(decision.hold, vec![0, 1, 2, 3]);

        let decision = player("2h 7h Jh Kh 9c");
        assert_eq!(decision.id, "H4.FD");
    }

    #[test]
    fn gutshot_and_edge_runs_are_not_open_ended() {
        assert_eq!(player("5c 6d 7h 8s Kc").id, "H4.OESD");
        // A gutshot 5-6-8-9 is not a straight draw for the player.
        assert_eq!(player("5c 6d 8h 9s 2c").id, "H0.ALL");
        // J-Q-K-A can only be completed at one end.
        assert_eq!(player("Jc Qd Kh As 3c").id, "H1.AK");
        // 2-3-4-5 starts at the lowest rank.
        assert_eq!(player("2c 3d 4h 5s 9c").id, "H0.ALL");
    }

    #[test]
    fn flush_draw_is_preferred_over_a_pair() {
        let decision = player("Kc Kd 2d 7d 9d");
        assert_eq!(decision.id, "H4.FD");
        assert_eq!(decision.hold, vec![1, 2, 3, 4]);
    }

    #[test]
    fn three_card_royal_draw_beats_two_pair() {
        let decision = player("Ks Kh Qs Qh Js");
        assert_eq!(decision.id, "H3.RFD");
        assert_eq!(decision.hold, vec![0, 2, 4]);
    }

    #[test]
    fn dealer_two_pair_holds_both_pairs() {
        let decision = dealer("9c 4d 9h 4s Ac");
        assert_eq!(decision.id, "D.PAIR+");
        assert_eq!(decision.hold, vec![0, 1, 2, 3]);
    }

    #[test]
    fn dealer_two_highest_breaks_ties_by_position() {
        let decision = dealer("2c Kd 9h Ks 5c");
        assert_eq!(decision.id, "D.PAIR+");

        let decision = dealer("2c Qd 9h Qs 5c");
        assert_eq!(decision.hold, vec![1, 3]);

        let decision = dealer("Jc 3d 9h 2s Jh");
        assert_eq!(decision.id, "D.PAIR+");

        let decision = dealer("Jc 3d 9h 2s Qh");
        assert_eq!(decision.id, "D.HI2");
        assert_eq!(decision.hold, vec![0, 4]);
    }
}
