//! Simulation input and output records

use serde::{Deserialize, Serialize};

/// One well-formed entry of the caller-supplied historical series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: String,
    pub close: f64,
    pub volume: f64,
}

impl Observation {
    pub fn new(date: impl Into<String>, close: f64, volume: f64) -> Self {
        Self {
            date: date.into(),
            close,
            volume,
        }
    }

    /// Cash moved by trading this observation's volume at its close
    pub fn notional(&self) -> f64 {
        self.close * self.volume
    }
}

/// Aggregate metrics of one simulation run. Money and percentages are
/// rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub strategy_id: i64,
    pub total_trades: u64,
    pub profit_loss: f64,
    pub win_rate: f64,
    pub max_drawdown: f64,
}
