//! Strategy backtesting engine.
//!
//! A pure pipeline over one request's data: the normalizer turns the raw
//! series into observations, the rules classify each observation into buy
//! and sell signals, and the ledger folds the signals into the final metrics.
//! Nothing here performs I/O or keeps state between runs.

pub mod engine;
pub mod ledger;
pub mod normalizer;
pub mod rules;

pub use engine::{SimulationEngine, SimulationRun};
pub use ledger::{Ledger, INITIAL_BALANCE};
pub use normalizer::normalize;
pub use rules::{evaluate, MomentumRule, Side, SignalRule, Signals};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("historical data is required")]
    MissingHistoricalData,
}
