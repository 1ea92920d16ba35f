//! Tunes the bust penalty until the house edge settles inside a target band.
//!
//! Each iteration runs a full simulation, measures the house take, and moves
//! `bust_penalty_multiplier` toward the configured target edge.

use serde::Serialize;
use tracing::info;

use crate::cards::DeckSource;
use crate::config::SimConfig;
use crate::error::SimResult;
use crate::simulation::{Simulation, SimulationReport};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalancerSettings {
    pub min_edge: f64,
    pub max_edge: f64,
    pub learning_rate: f64,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
    pub max_iterations: u32,
}

impl Default for BalancerSettings {
    fn default() -> Self {
        Self {
            min_edge: 0.03,
            max_edge: 0.07,
            learning_rate: 0.8,
            min_multiplier: 0.5,
            max_multiplier: 3.0,
            max_iterations: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalanceStep {
    pub iteration: u32,
    pub bust_penalty_multiplier: f64,
    pub house_edge: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceOutcome {
    pub converged: bool,
    pub steps: Vec<BalanceStep>,
    pub config: SimConfig,
    pub report: SimulationReport,
}

pub struct AutoBalancer {
    config: SimConfig,
    settings: BalancerSettings,
}

impl AutoBalancer {
    pub fn new(config: SimConfig, settings: BalancerSettings) -> Self {
        Self { config, settings }
    }

    /// Multiplier after one adjustment for a measured `edge`.
    pub fn adjusted(&self, multiplier: f64, edge: f64) -> f64 {
        let gap = self.config.target_edge - edge;
        (multiplier + self.settings.learning_rate * gap)
            .clamp(self.settings.min_multiplier, self.settings.max_multiplier)
    }

    pub fn in_band(&self, edge: f64) -> bool {
        (self.settings.min_edge..=self.settings.max_edge).contains(&edge)
    }

    /// Runs until the edge lands in the band or the iteration budget is spent.
    /// Every iteration draws its decks from the same `decks` source.
    pub fn run<D: DeckSource>(mut self, decks: &mut D) -> SimResult<BalanceOutcome> {
        let mut steps = Vec::new();
        let iterations = self.settings.max_iterations.max(1);
        let mut iteration = 0;

        loop {
            let simulation = Simulation::new(self.config.clone())?;
            let report = simulation.run(decks)?;
            let edge = report.house_edge();
            let multiplier = self.config.bust_penalty_multiplier;
            info!(iteration, edge, multiplier, "balancer iteration");
            steps.push(BalanceStep {
                iteration,
                bust_penalty_multiplier: multiplier,
                house_edge: edge,
            });

            let converged = self.in_band(edge);
            if converged {
                info!(iteration, edge, "house edge stabilised inside the target band");
            }
            if converged || iteration + 1 >= iterations {
                return Ok(BalanceOutcome {
                    converged,
                    steps,
                    config: self.config,
                    report,
                });
            }

            self.config.bust_penalty_multiplier = self.adjusted(multiplier, edge);
            iteration += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjustment_moves_toward_target_and_clamps() {
        let balancer = AutoBalancer::new(SimConfig::default(), BalancerSettings::default());
        // Edge below target raises the penalty.
        assert!((balancer.adjusted(1.0, 0.0) - 1.04).abs() < 1e-9);
        // Edge above target lowers it.
        assert!(balancer.adjusted(1.0, 0.30) < 1.0);
        assert_eq!(balancer.adjusted(2.99, -5.0), 3.0);
        assert_eq!(balancer.adjusted(0.6, 5.0), 0.5);
    }

    #[test]
    fn band_is_inclusive() {
        let balancer = AutoBalancer::new(SimConfig::default(), BalancerSettings::default());
        assert!(balancer.in_band(0.03));
        assert!(balancer.in_band(0.07));
        assert!(!balancer.in_band(0.071));
    }
}
