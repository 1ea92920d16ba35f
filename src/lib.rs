pub mod balancer;
pub mod cards;
pub mod config;
pub mod console;
pub mod error;
pub mod hand;
pub mod round;
pub mod simulation;
pub mod strategy;
pub mod tubes;
pub mod web;

pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use simulation::{Progress, Simulation, SimulationReport};
