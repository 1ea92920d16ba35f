//! The tube economy: five depletable reserves, one per qualifying hand.
//!
//! A win on a qualifying hand drains the whole reserve ("winner takes all").
//! A win against an empty reserve is a bust. Reserves are refilled by ante
//! trickles, bust penalties and forced house refills.
//!
//! Every reserve tracks lifetime funding and withdrawals so that
//! `funded - taken == balance` can be audited at any point.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::error::{SimError, SimResult};
use crate::hand::HandCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tube {
    Straight,
    Flush,
    FullHouse,
    StraightFlush,
    RoyalFlush,
}

impl Tube {
    pub const ALL: [Tube; 5] = [
        Tube::Straight,
        Tube::Flush,
        Tube::FullHouse,
        Tube::StraightFlush,
        Tube::RoyalFlush,
    ];

    /// The reserve a winning hand claims from, if any.
    pub fn for_category(category: HandCategory) -> Option<Tube> {
        match category {
            HandCategory::Straight => Some(Tube::Straight),
            HandCategory::Flush => Some(Tube::Flush),
            HandCategory::FullHouse => Some(Tube::FullHouse),
            HandCategory::StraightFlush => Some(Tube::StraightFlush),
            HandCategory::RoyalFlush => Some(Tube::RoyalFlush),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn code(self) -> &'static str {
        match self {
            Tube::Straight => "ST",
            Tube::Flush => "FL",
            Tube::FullHouse => "FH",
            Tube::StraightFlush => "SF",
            Tube::RoyalFlush => "RF",
        }
    }
}

impl Display for Tube {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Who put credits into a reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "seat")]
pub enum Contributor {
    House,
    Player(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefillReason {
    Refill,
    Ante,
    BustPenalty,
}

/// Result of a claim against the tube economy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutAttempt {
    /// The hand does not map to a reserve; it is paid from the base wager.
    NotApplicable,
    Paid { tube: Tube, amount: u64 },
    Bust { tube: Tube },
}

impl PayoutAttempt {
    pub fn amount(&self) -> u64 {
        match self {
            PayoutAttempt::Paid { amount, .. } => *amount,
            _ => 0,
        }
    }

    pub fn is_bust(&self) -> bool {
        matches!(self, PayoutAttempt::Bust { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Reserve {
    pub balance: u64,
    pub funded: u64,
    pub taken: u64,
    pub hits: u64,
    pub busts: u64,
}

/// One deposit, kept for audit and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Refill {
    pub tube: Tube,
    pub amount: u64,
    pub source: Contributor,
    pub reason: RefillReason,
}

/// Balances of all five reserves, in [`Tube::ALL`] order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TubeBalances(pub [u64; 5]);

impl TubeBalances {
    pub fn get(&self, tube: Tube) -> u64 {
        self.0[tube.index()]
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TubeLedger {
    reserves: [Reserve; 5],
    seeds: TubeBalances,
}

impl TubeLedger {
    /// Seeds each reserve; the seed counts as funding.
    pub fn new(seeds: TubeBalances) -> Self {
        let mut reserves = [Reserve::default(); 5];
        for (reserve, seed) in reserves.iter_mut().zip(seeds.0) {
            reserve.balance = seed;
            reserve.funded = seed;
        }
        Self { reserves, seeds }
    }

    pub fn reserve(&self, tube: Tube) -> &Reserve {
        &self.reserves[tube.index()]
    }

    pub fn balance(&self, tube: Tube) -> u64 {
        self.reserve(tube).balance
    }

    pub fn seed(&self, tube: Tube) -> u64 {
        self.seeds.get(tube)
    }

    pub fn balances(&self) -> TubeBalances {
        TubeBalances(self.reserves.map(|reserve| reserve.balance))
    }

    /// Claims the reserve for `category`: drains it when it holds credits,
    /// otherwise records a bust. The drained reserve is left at zero.
    pub fn attempt_payout(&mut self, category: HandCategory) -> PayoutAttempt {
        let Some(tube) = Tube::for_category(category) else {
            return PayoutAttempt::NotApplicable;
        };
        let reserve = &mut self.reserves[tube.index()];
        if reserve.balance == 0 {
            reserve.busts += 1;
            return PayoutAttempt::Bust { tube };
        }
        let amount = reserve.balance;
        reserve.balance = 0;
        reserve.taken += amount;
        reserve.hits += 1;
        PayoutAttempt::Paid { tube, amount }
    }

    pub fn refill(
        &mut self,
        tube: Tube,
        amount: u64,
        source: Contributor,
        reason: RefillReason,
    ) -> Refill {
        let reserve = &mut self.reserves[tube.index()];
        reserve.balance += amount;
        reserve.funded += amount;
        Refill {
            tube,
            amount,
            source,
            reason,
        }
    }

    /// Reserves whose balance is strictly below `threshold`.
    pub fn below_threshold(&self, threshold: u64) -> Vec<Tube> {
        Tube::ALL
            .into_iter()
            .filter(|&tube| self.balance(tube) < threshold)
            .collect()
    }

    /// The reserve with the smallest balance; ties go to the earlier tube.
    pub fn lowest(&self) -> Tube {
        Tube::ALL
            .into_iter()
            .min_by_key(|&tube| self.balance(tube))
            .unwrap_or(Tube::Straight)
    }

    /// Checks `funded - taken == balance` for every reserve.
    pub fn verify(&self) -> SimResult<()> {
        for tube in Tube::ALL {
            let reserve = self.reserve(tube);
            if reserve.funded.checked_sub(reserve.taken) != Some(reserve.balance) {
                return Err(SimError::LedgerInvariant {
                    tube,
                    funded: reserve.funded,
                    taken: reserve.taken,
                    balance: reserve.balance,
                });
            }
        }
        Ok(())
    }
}
