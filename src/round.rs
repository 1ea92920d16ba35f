use std::cmp::Ordering;

use serde::Serialize;
use serde_with::{DisplayFromStr, serde_as};
use tracing::debug;

use crate::cards::{Card, Deck};
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::hand::{HandClassification, classify, ensure_hand_size};
use crate::strategy::Decision;
use crate::tubes::{
    Contributor, PayoutAttempt, Refill, RefillReason, Tube, TubeBalances, TubeLedger,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "role", content = "index")]
pub enum Seat {
    Dealer,
    Player(usize),
}

/// One seat's hand as it moves through deal, hold and draw.
#[derive(Debug, Clone)]
pub struct Participant {
    pub seat: Seat,
    pub dealt: Vec<Card>,
    pub decision: Decision,
    pub final_hand: Vec<Card>,
}

impl Participant {
    pub fn new(seat: Seat, dealt: Vec<Card>, decision: Decision) -> Self {
        let final_hand = dealt.clone();
        Self {
            seat,
            dealt,
            decision,
            final_hand,
        }
    }

    /// Replaces every card not held by the decision with the next cards from `deck`.
    pub fn draw(&mut self, deck: &mut Deck) -> SimResult<()> {
        let mut replacements = deck.deal(self.decision.draw_count())?.into_iter();
        for (position, card) in self.final_hand.iter_mut().enumerate() {
            if !self.decision.holds(position)
                && let Some(replacement) = replacements.next()
            {
                *card = replacement;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Lose,
    Tie,
    Bust,
}

#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub struct PlayerOutcome {
    pub seat: usize,
    pub decision: &'static str,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub final_hand: Vec<Card>,
    pub classification: HandClassification,
    pub outcome: Outcome,
    pub ante_delta: i64,
    pub tube_payout: u64,
    pub bust_penalty: u64,
    pub net: i64,
}

#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub struct DealerOutcome {
    pub decision: &'static str,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub final_hand: Vec<Card>,
    pub classification: HandClassification,
    pub busted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TubePayout {
    pub seat: usize,
    pub tube: Tube,
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BustPenalty {
    pub seat: usize,
    pub tube: Tube,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundResult {
    pub round: u32,
    pub players: Vec<PlayerOutcome>,
    pub dealer: DealerOutcome,
    pub payouts: Vec<TubePayout>,
    pub penalties: Vec<BustPenalty>,
    pub refills: Vec<Refill>,
    pub tube_balances: TubeBalances,
    /// Reserves refilled by the house this round: busted ones and those below the threshold.
    pub stack_triggers: Vec<Tube>,
}

/// The slice of configuration that shapes how a round settles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundRules {
    pub ante: i64,
    pub bust_penalty: u64,
    pub dealer_wins_ties: bool,
    pub dealer_bust_allowed: bool,
    pub stack_trigger_threshold: u64,
    pub ante_trickle: u64,
    pub bust_penalty_to_tube: bool,
    pub trigger_refill: Option<u64>,
}

impl TryFrom<&SimConfig> for RoundRules {
    type Error = SimError;

    fn try_from(config: &SimConfig) -> SimResult<Self> {
        let ante = i64::try_from(config.ante).map_err(|_| {
            SimError::InvalidConfig(format!("ante {} does not fit in signed credits", config.ante))
        })?;
        Ok(Self {
            ante,
            bust_penalty: config.bust_penalty(),
            dealer_wins_ties: config.dealer_wins_on_same_ht,
            dealer_bust_allowed: config.dealer_bust_allowed,
            stack_trigger_threshold: config.stack_trigger_threshold,
            ante_trickle: config.ante_trickle,
            bust_penalty_to_tube: config.bust_penalty_to_tube,
            trigger_refill: config.trigger_refill,
        })
    }
}

/// Settles one round against the tube state left by the previous one.
///
/// Order: ante trickles, players in seat order, bust penalty deposits, then
/// house refills of busted reserves and reserves below the threshold.
/// Fails if any final hand does not hold exactly five cards.
pub fn resolve_round(
    rules: &RoundRules,
    round: u32,
    mut tubes: TubeLedger,
    dealer: &Participant,
    players: &[Participant],
) -> SimResult<(RoundResult, TubeLedger)> {
    ensure_hand_size(&dealer.final_hand)?;
    for player in players {
        ensure_hand_size(&player.final_hand)?;
    }

    let mut refills = Vec::new();
    if rules.ante_trickle > 0 {
        for _ in players {
            let tube = tubes.lowest();
            refills.push(tubes.refill(
                tube,
                rules.ante_trickle,
                Contributor::House,
                RefillReason::Ante,
            ));
        }
    }

    let dealer_class = classify(&dealer.final_hand)?;
    let dealer_busted = rules.dealer_bust_allowed
        && Tube::for_category(dealer_class.category).is_some_and(|tube| tubes.balance(tube) == 0);
    if dealer_busted {
        debug!(round, category = %dealer_class.category, "dealer busted on an empty reserve");
    }

    let ante = rules.ante;
    let mut outcomes = Vec::with_capacity(players.len());
    let mut payouts = Vec::new();
    let mut penalties = Vec::new();
    let mut busted_tubes = Vec::new();

    for (seat, player) in players.iter().enumerate() {
        let class = classify(&player.final_hand)?;
        let (mut outcome, mut ante_delta, mut tube_payout, mut bust_penalty) =
            (Outcome::Tie, 0i64, 0u64, 0u64);

        match class.cmp(&dealer_class) {
            Ordering::Greater => match tubes.attempt_payout(class.category) {
                PayoutAttempt::NotApplicable => {
                    outcome = Outcome::Win;
                    ante_delta = ante;
                }
                PayoutAttempt::Paid { tube, amount } => {
                    outcome = Outcome::Win;
                    ante_delta = ante;
                    tube_payout = amount;
                    payouts.push(TubePayout { seat, tube, amount });
                }
                PayoutAttempt::Bust { tube } => {
                    debug!(round, seat, %tube, "player busted on an empty reserve");
                    outcome = Outcome::Bust;
                    bust_penalty = rules.bust_penalty;
                    penalties.push(BustPenalty {
                        seat,
                        tube,
                        amount: bust_penalty,
                    });
                    busted_tubes.push(tube);
                }
            },
            // Exact ties go to the dealer even when the dealer busted.
            Ordering::Equal if rules.dealer_wins_ties => {
                outcome = Outcome::Lose;
                ante_delta = -ante;
            }
            Ordering::Less if !dealer_busted => {
                outcome = Outcome::Lose;
                ante_delta = -ante;
            }
            _ => {}
        }

        outcomes.push(PlayerOutcome {
            seat,
            decision: player.decision.id,
            final_hand: player.final_hand.clone(),
            classification: class,
            outcome,
            ante_delta,
            tube_payout,
            bust_penalty,
            net: ante_delta + tube_payout as i64 - bust_penalty as i64,
        });
    }

    if rules.bust_penalty_to_tube {
        for penalty in penalties.iter().filter(|penalty| penalty.amount > 0) {
            refills.push(tubes.refill(
                penalty.tube,
                penalty.amount,
                Contributor::Player(penalty.seat),
                RefillReason::BustPenalty,
            ));
        }
    }

    let below = tubes.below_threshold(rules.stack_trigger_threshold);
    let stack_triggers: Vec<Tube> = Tube::ALL
        .into_iter()
        .filter(|tube| busted_tubes.contains(tube) || below.contains(tube))
        .collect();
    for &tube in &stack_triggers {
        let amount = rules.trigger_refill.unwrap_or_else(|| tubes.seed(tube));
        debug!(round, %tube, amount, "stack trigger refill");
        if amount > 0 {
            refills.push(tubes.refill(tube, amount, Contributor::House, RefillReason::Refill));
        }
    }

    let result = RoundResult {
        round,
        players: outcomes,
        dealer: DealerOutcome {
            decision: dealer.decision.id,
            final_hand: dealer.final_hand.clone(),
            classification: dealer_class,
            busted: dealer_busted,
        },
        payouts,
        penalties,
        refills,
        tube_balances: tubes.balances(),
        stack_triggers,
    };
    Ok((result, tubes))
}
