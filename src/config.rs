use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{SimError, SimResult};
use crate::tubes::TubeBalances;

/// Each participant can use at most ten cards per round from one 52-card deck.
pub const MAX_PLAYERS: u32 = 4;

/// Ceiling for the ante, tube seeds and forced refill amounts.
/// Keeps run totals well inside signed 64-bit credits.
pub const MAX_CREDITS: u64 = 1_000_000;

pub const MAX_PENALTY_MULTIPLIER: f64 = 10.0;

/// Options consumed by the simulation runner.
///
/// Every field falls back to its default when omitted; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimConfig {
    pub rounds_per_run: u32,
    pub player_count: u32,
    pub ante: u64,

    pub init_straight_tube: u64,
    pub init_flush_tube: u64,
    pub init_full_house_tube: u64,
    pub init_straight_flush_tube: u64,
    pub init_royal_flush_tube: u64,

    pub dealer_draw_allowed: bool,
    /// A dealer whose hand lands on an empty reserve cannot beat anyone.
    pub dealer_bust_allowed: bool,
    /// Exact ties go to the dealer.
    #[serde(rename = "dealerWinsOnSameHT")]
    pub dealer_wins_on_same_ht: bool,

    pub bust_penalty_multiplier: f64,
    /// Reserves strictly below this balance are refilled by the house.
    pub stack_trigger_threshold: u64,
    /// Credits of each ante deposited into the lowest reserve every round.
    pub ante_trickle: u64,
    /// Deposit bust penalties into the busted reserve instead of keeping them.
    pub bust_penalty_to_tube: bool,
    /// Amount of a forced refill; `None` refills by the reserve's seed.
    pub trigger_refill: Option<u64>,

    /// Rounds between progress callbacks; 0 picks about 1% of the run.
    pub progress_interval: u32,
    pub keep_history: bool,
    /// House edge the auto-balancer aims for.
    pub target_edge: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rounds_per_run: 20_000,
            player_count: 4,
            ante: 5,
            init_straight_tube: 5,
            init_flush_tube: 10,
            init_full_house_tube: 15,
            init_straight_flush_tube: 20,
            init_royal_flush_tube: 25,
            dealer_draw_allowed: true,
            dealer_bust_allowed: false,
            dealer_wins_on_same_ht: false,
            bust_penalty_multiplier: 1.0,
            stack_trigger_threshold: 0,
            ante_trickle: 1,
            bust_penalty_to_tube: true,
            trigger_refill: None,
            progress_interval: 0,
            keep_history: false,
            target_edge: 0.05,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(raw: &str) -> SimResult<Self> {
        serde_json::from_str(raw).map_err(|err| SimError::ConfigFile(err.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|err| SimError::ConfigFile(format!("{}: {err}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Coerces recoverable values and rejects the rest, before any round runs.
    pub fn validated(mut self) -> SimResult<Self> {
        if self.rounds_per_run == 0 {
            warn!("roundsPerRun must be at least 1; using 1");
            self.rounds_per_run = 1;
        }
        if self.player_count == 0 {
            warn!("playerCount must be at least 1; using 1");
            self.player_count = 1;
        }
        if self.player_count > MAX_PLAYERS {
            return Err(SimError::InvalidConfig(format!(
                "playerCount {} exceeds the {MAX_PLAYERS} seats one deck can serve",
                self.player_count
            )));
        }
        if self.ante == 0 {
            return Err(SimError::InvalidConfig("ante must be positive".into()));
        }
        if !(0.0..=MAX_PENALTY_MULTIPLIER).contains(&self.bust_penalty_multiplier) {
            return Err(SimError::InvalidConfig(format!(
                "bustPenaltyMultiplier must be within 0..={MAX_PENALTY_MULTIPLIER}, got {}",
                self.bust_penalty_multiplier
            )));
        }
        let amounts = [
            ("ante", self.ante),
            ("initStraightTube", self.init_straight_tube),
            ("initFlushTube", self.init_flush_tube),
            ("initFullHouseTube", self.init_full_house_tube),
            ("initStraightFlushTube", self.init_straight_flush_tube),
            ("initRoyalFlushTube", self.init_royal_flush_tube),
            ("triggerRefill", self.trigger_refill.unwrap_or_default()),
        ];
        if let Some((name, amount)) = amounts.iter().find(|(_, amount)| *amount > MAX_CREDITS) {
            return Err(SimError::InvalidConfig(format!(
                "{name} {amount} exceeds the {MAX_CREDITS} credit ceiling"
            )));
        }
        if self.ante_trickle > self.ante {
            warn!(
                trickle = self.ante_trickle,
                ante = self.ante,
                "anteTrickle exceeds the ante; capping"
            );
            self.ante_trickle = self.ante;
        }
        Ok(self)
    }

    pub fn tube_seeds(&self) -> TubeBalances {
        TubeBalances([
            self.init_straight_tube,
            self.init_flush_tube,
            self.init_full_house_tube,
            self.init_straight_flush_tube,
            self.init_royal_flush_tube,
        ])
    }

    pub fn bust_penalty(&self) -> u64 {
        (self.ante as f64 * self.bust_penalty_multiplier).round() as u64
    }

    pub fn progress_every(&self) -> u32 {
        if self.progress_interval > 0 {
            self.progress_interval
        } else {
            (self.rounds_per_run / 100).max(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_and_unknown_keys_fall_back_to_defaults() {
        let config = SimConfig::from_json_str(
            r#"{ "roundsPerRun": 250, "dealerWinsOnSameHT": true, "tubeColor": "red" }"#,
        )
        .unwrap();
        assert_eq!(config.rounds_per_run, 250);
        assert!(config.dealer_wins_on_same_ht);
        assert_eq!(config.player_count, 4);
        assert_eq!(config.tube_seeds(), TubeBalances([5, 10, 15, 20, 25]));
    }

    #[test]
    fn zero_rounds_are_coerced_and_bad_values_rejected() {
        let config = SimConfig {
            rounds_per_run: 0,
            player_count: 0,
            ..SimConfig::default()
        }
        .validated()
        .unwrap();
        assert_eq!(config.rounds_per_run, 1);
        assert_eq!(config.player_count, 1);

        let too_many = SimConfig {
            player_count: 5,
            ..SimConfig::default()
        };
        assert!(matches!(too_many.validated(), Err(SimError::InvalidConfig(_))));

        let negative = SimConfig {
            bust_penalty_multiplier: -0.5,
            ..SimConfig::default()
        };
        assert!(negative.validated().is_err());
    }

    #[test]
    fn oversized_credit_amounts_are_rejected() {
        let huge_ante = SimConfig {
            ante: 1 << 63,
            ..SimConfig::default()
        };
        assert!(matches!(huge_ante.validated(), Err(SimError::InvalidConfig(_))));

        let huge_penalty = SimConfig {
            bust_penalty_multiplier: 1e12,
            ..SimConfig::default()
        };
        assert!(matches!(huge_penalty.validated(), Err(SimError::InvalidConfig(_))));

        let huge_seed = SimConfig {
            init_royal_flush_tube: u64::MAX,
            ..SimConfig::default()
        };
        assert!(huge_seed.validated().is_err());

        let at_ceiling = SimConfig {
            ante: MAX_CREDITS,
            ..SimConfig::default()
        };
        assert_eq!(at_ceiling.validated().unwrap().ante, MAX_CREDITS);
    }

    #[test]
    fn bust_penalty_rounds_to_whole_credits() {
        let config = SimConfig {
            ante: 5,
            bust_penalty_multiplier: 1.5,
            ..SimConfig::default()
        };
        assert_eq!(config.bust_penalty(), 8);
    }
}
