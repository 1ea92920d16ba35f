//! Monte-Carlo runner and the statistics it aggregates.
//!
//! Rounds run strictly in sequence: each one settles against the tube state
//! left by the previous round. The runner owns that state and the running
//! statistics for the duration of one call and keeps nothing between calls.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::cards::DeckSource;
use crate::config::SimConfig;
use crate::error::SimResult;
use crate::hand::{HAND_SIZE, HandCategory, ensure_hand_size};
use crate::round::{Outcome, Participant, RoundResult, RoundRules, Seat, resolve_round};
use crate::strategy::{self, PLAYER};
use crate::tubes::{Contributor, RefillReason, Tube, TubeLedger};

const TOP_RULES: usize = 10;

/// Passed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeatStats {
    pub hands: u64,
    pub wins: u64,
    pub losses: u64,
    pub ties: u64,
    pub busts: u64,
    pub wagered: u64,
    pub net_credits: i64,
    pub tube_winnings: u64,
    pub penalties: u64,
}

impl SeatStats {
    fn absorb(&mut self, other: &SeatStats) {
        self.hands += other.hands;
        self.wins += other.wins;
        self.losses += other.losses;
        self.ties += other.ties;
        self.busts += other.busts;
        self.wagered += other.wagered;
        self.net_credits += other.net_credits;
        self.tube_winnings += other.tube_winnings;
        self.penalties += other.penalties;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecisionStats {
    pub uses: u64,
    pub wins: u64,
    pub losses: u64,
    pub ties: u64,
    pub busts: u64,
}

/// Funding and withdrawals observed during a run; seeds are not included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TubeStats {
    pub funded: u64,
    pub taken: u64,
    pub hits: u64,
    pub busts: u64,
    pub triggers: u64,
}

/// Running counters, updated once per round and never rolled back.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationStats {
    pub rounds: u32,
    pub seats: Vec<SeatStats>,
    pub decisions: BTreeMap<&'static str, DecisionStats>,
    pub dealer_decisions: BTreeMap<&'static str, u64>,
    pub categories: [u64; HandCategory::COUNT],
    pub tubes: [TubeStats; 5],
    pub dealer_busts: u64,
    pub stack_triggers: u64,
    pub house_refills: u64,
    pub ante_trickles: u64,
    pub penalties_to_tubes: u64,
    pub penalties_retained: u64,
}

impl SimulationStats {
    pub fn new(players: usize) -> Self {
        Self {
            seats: vec![SeatStats::default(); players],
            ..Self::default()
        }
    }

    pub fn record(&mut self, ante: u64, result: &RoundResult) {
        self.rounds += 1;

        for player in &result.players {
            let seat = &mut self.seats[player.seat];
            seat.hands += 1;
            seat.wagered += ante;
            seat.net_credits += player.net;
            seat.tube_winnings += player.tube_payout;
            seat.penalties += player.bust_penalty;

            let decision = self.decisions.entry(player.decision).or_default();
            decision.uses += 1;
            match player.outcome {
                Outcome::Win => {
                    seat.wins += 1;
                    decision.wins += 1;
                }
                Outcome::Lose => {
                    seat.losses += 1;
                    decision.losses += 1;
                }
                Outcome::Tie => {
                    seat.ties += 1;
                    decision.ties += 1;
                }
                Outcome::Bust => {
                    seat.busts += 1;
                    decision.busts += 1;
                }
            }
            self.categories[player.classification.category.index()] += 1;
        }

        *self.dealer_decisions.entry(result.dealer.decision).or_default() += 1;
        self.categories[result.dealer.classification.category.index()] += 1;
        if result.dealer.busted {
            self.dealer_busts += 1;
        }

        for payout in &result.payouts {
            let tube = &mut self.tubes[payout.tube.index()];
            tube.taken += payout.amount;
            tube.hits += 1;
        }
        let mut penalties_deposited = 0;
        for refill in &result.refills {
            self.tubes[refill.tube.index()].funded += refill.amount;
            match (refill.reason, refill.source) {
                (RefillReason::Ante, _) => self.ante_trickles += refill.amount,
                (RefillReason::BustPenalty, _) => penalties_deposited += refill.amount,
                (RefillReason::Refill, Contributor::House) => {
                    self.house_refills += refill.amount;
                }
                (RefillReason::Refill, Contributor::Player(_)) => {}
            }
        }
        let penalties: u64 = result.penalties.iter().map(|p| p.amount).sum();
        for penalty in &result.penalties {
            self.tubes[penalty.tube.index()].busts += 1;
        }
        self.penalties_to_tubes += penalties_deposited;
        self.penalties_retained += penalties - penalties_deposited;

        for tube in &result.stack_triggers {
            self.tubes[tube.index()].triggers += 1;
        }
        self.stack_triggers += result.stack_triggers.len() as u64;
    }

    pub fn player_totals(&self) -> SeatStats {
        let mut totals = SeatStats::default();
        for seat in &self.seats {
            totals.absorb(seat);
        }
        totals
    }

    /// House result: lost antes, retained penalties, minus funding put into reserves.
    pub fn house_net(&self) -> i64 {
        let ante_result: i64 = -self
            .seats
            .iter()
            .map(|seat| seat.net_credits + seat.penalties as i64 - seat.tube_winnings as i64)
            .sum::<i64>();
        ante_result + self.penalties_retained as i64
            - self.ante_trickles as i64
            - self.house_refills as i64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerSummary {
    pub hands: u64,
    pub wins: u64,
    pub losses: u64,
    pub ties: u64,
    pub busts: u64,
    pub win_rate: f64,
    pub total_wagered: u64,
    pub net_credits: i64,
    pub return_percent: f64,
    pub tube_winnings: u64,
    pub bust_penalties: u64,
}

impl PlayerSummary {
    fn from_stats(stats: &SeatStats) -> Self {
        Self {
            hands: stats.hands,
            wins: stats.wins,
            losses: stats.losses,
            ties: stats.ties,
            busts: stats.busts,
            win_rate: ratio(stats.wins, stats.hands),
            total_wagered: stats.wagered,
            net_credits: stats.net_credits,
            return_percent: signed_ratio(stats.net_credits, stats.wagered) * 100.0,
            tube_winnings: stats.tube_winnings,
            bust_penalties: stats.penalties,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatSummary {
    pub seat: usize,
    #[serde(flatten)]
    pub summary: PlayerSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct HouseSummary {
    pub net_profit: i64,
    pub take_percent: f64,
    pub reserve_funding: u64,
    pub penalties_retained: u64,
    pub dealer_busts: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TubeSummary {
    pub tube: Tube,
    pub seed: u64,
    pub funded: u64,
    pub taken: u64,
    pub hits: u64,
    pub busts: u64,
    pub triggers: u64,
    pub final_balance: u64,
    /// Share of everything put into the reserve, seed included, that was paid out.
    pub return_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleUsage {
    pub id: &'static str,
    pub description: &'static str,
    pub uses: u64,
    pub usage_percent: f64,
    pub wins: u64,
    pub losses: u64,
    pub ties: u64,
    pub busts: u64,
    pub win_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryShare {
    pub category: HandCategory,
    pub count: u64,
    pub percent: f64,
}

/// Raw numbers for a finished run; formatting is left to the consumer.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub rounds_completed: u32,
    pub player_count: u32,
    pub ante: u64,
    pub players: PlayerSummary,
    pub seats: Vec<SeatSummary>,
    pub house: HouseSummary,
    pub tubes: Vec<TubeSummary>,
    pub top_rules: Vec<RuleUsage>,
    pub dealer_rules: BTreeMap<&'static str, u64>,
    pub hand_distribution: Vec<CategoryShare>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<RoundResult>,
}

impl SimulationReport {
    /// House take as a fraction of everything wagered.
    pub fn house_edge(&self) -> f64 {
        self.house.take_percent / 100.0
    }

    pub fn classified_hands(&self) -> u64 {
        self.hand_distribution.iter().map(|share| share.count).sum()
    }

    fn build(
        config: &SimConfig,
        stats: &SimulationStats,
        tubes: &TubeLedger,
        history: Vec<RoundResult>,
    ) -> Self {
        let totals = stats.player_totals();
        let house_net = stats.house_net();

        let tube_rows = Tube::ALL
            .into_iter()
            .map(|tube| {
                let observed = stats.tubes[tube.index()];
                let seed = tubes.seed(tube);
                TubeSummary {
                    tube,
                    seed,
                    funded: observed.funded,
                    taken: observed.taken,
                    hits: observed.hits,
                    busts: observed.busts,
                    triggers: observed.triggers,
                    final_balance: tubes.balance(tube),
                    return_rate: ratio(observed.taken, seed + observed.funded),
                }
            })
            .collect();

        let mut rules: Vec<RuleUsage> = PLAYER
            .rules()
            .filter_map(|rule| {
                let used = stats.decisions.get(rule.id)?;
                Some(RuleUsage {
                    id: rule.id,
                    description: rule.description,
                    uses: used.uses,
                    usage_percent: ratio(used.uses, totals.hands) * 100.0,
                    wins: used.wins,
                    losses: used.losses,
                    ties: used.ties,
                    busts: used.busts,
                    win_rate: ratio(used.wins, used.uses),
                })
            })
            .collect();
        rules.sort_by(|a, b| b.uses.cmp(&a.uses).then_with(|| a.id.cmp(b.id)));
        rules.truncate(TOP_RULES);

        let classified: u64 = stats.categories.iter().sum();
        let hand_distribution = HandCategory::ALL
            .into_iter()
            .map(|category| {
                let count = stats.categories[category.index()];
                CategoryShare {
                    category,
                    count,
                    percent: ratio(count, classified) * 100.0,
                }
            })
            .collect();

        Self {
            rounds_completed: stats.rounds,
            player_count: config.player_count,
            ante: config.ante,
            players: PlayerSummary::from_stats(&totals),
            seats: stats
                .seats
                .iter()
                .enumerate()
                .map(|(seat, seat_stats)| SeatSummary {
                    seat,
                    summary: PlayerSummary::from_stats(seat_stats),
                })
                .collect(),
            house: HouseSummary {
                net_profit: house_net,
                take_percent: signed_ratio(house_net, totals.wagered) * 100.0,
                reserve_funding: stats.ante_trickles + stats.house_refills,
                penalties_retained: stats.penalties_retained,
                dealer_busts: stats.dealer_busts,
            },
            tubes: tube_rows,
            top_rules: rules,
            dealer_rules: stats.dealer_decisions.clone(),
            hand_distribution,
            history,
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn signed_ratio(numerator: i64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Drives independent rounds for one validated configuration.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    rules: RoundRules,
}

impl Simulation {
    pub fn new(config: SimConfig) -> SimResult<Self> {
        let config = config.validated()?;
        let rules = RoundRules::try_from(&config)?;
        Ok(Self { config, rules })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn initial_tubes(&self) -> TubeLedger {
        TubeLedger::new(self.config.tube_seeds())
    }

    pub fn run<D: DeckSource>(&self, decks: &mut D) -> SimResult<SimulationReport> {
        self.run_with_progress(decks, |_| {})
    }

    /// Runs every configured round, calling `on_progress` every
    /// `progress_every()` rounds and once more on completion.
    pub fn run_with_progress<D, F>(
        &self,
        decks: &mut D,
        mut on_progress: F,
    ) -> SimResult<SimulationReport>
    where
        D: DeckSource,
        F: FnMut(Progress),
    {
        let total = self.config.rounds_per_run;
        let every = self.config.progress_every();
        let players = self.config.player_count as usize;
        info!(rounds = total, players, ante = self.config.ante, "starting simulation");

        let mut tubes = self.initial_tubes();
        let mut stats = SimulationStats::new(players);
        let mut history = Vec::new();

        for round in 1..=total {
            let (result, next) = self.play_round(round, decks, tubes)?;
            next.verify()?;
            tubes = next;
            stats.record(self.config.ante, &result);
            if self.config.keep_history {
                history.push(result);
            }

            if round % every == 0 || round == total {
                debug!(completed = round, total, "progress");
                on_progress(Progress {
                    completed: round,
                    total,
                });
            }
        }

        let report = SimulationReport::build(&self.config, &stats, &tubes, history);
        info!(
            rounds = report.rounds_completed,
            player_return = report.players.return_percent,
            house_take = report.house.take_percent,
            "simulation finished"
        );
        Ok(report)
    }

    /// Deals, decides, draws and settles a single round.
    pub fn play_round<D: DeckSource>(
        &self,
        round: u32,
        decks: &mut D,
        tubes: TubeLedger,
    ) -> SimResult<(RoundResult, TubeLedger)> {
        let mut deck = decks.fresh_deck();

        let dealer_cards = deck.deal(HAND_SIZE)?;
        let mut seat_cards = Vec::with_capacity(self.config.player_count as usize);
        for _ in 0..self.config.player_count {
            seat_cards.push(deck.deal(HAND_SIZE)?);
        }

        let dealer_decision = if self.config.dealer_draw_allowed {
            strategy::dealer_decision(&dealer_cards)?
        } else {
            ensure_hand_size(&dealer_cards)?;
            strategy::dealer_stand()
        };
        let mut dealer = Participant::new(Seat::Dealer, dealer_cards, dealer_decision);

        let mut players = Vec::with_capacity(seat_cards.len());
        for (seat, cards) in seat_cards.into_iter().enumerate() {
            let decision = strategy::player_decision(&cards)?;
            players.push(Participant::new(Seat::Player(seat), cards, decision));
        }

        dealer.draw(&mut deck)?;
        for player in &mut players {
            player.draw(&mut deck)?;
        }

        resolve_round(&self.rules, round, tubes, &dealer, &players)
    }
}

/// Total credits held by the reserves at the start of a run.
pub fn seeded_total(config: &SimConfig) -> u64 {
    config.tube_seeds().total()
}
