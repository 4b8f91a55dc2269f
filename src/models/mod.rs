//! Shared data models spanning the service layers.

pub mod simulation;
pub mod strategy;
pub mod user;

pub use simulation::{Observation, SimulationResult};
pub use strategy::{Condition, Strategy, StrategyDraft, StrategyRecord, StrategyStatus};
pub use user::User;
