//! Backtest engine: normalize, evaluate, accumulate.

use serde_json::Value;
use tracing::debug;

use crate::models::simulation::{Observation, SimulationResult};
use crate::models::strategy::Strategy;
use crate::simulation::ledger::Ledger;
use crate::simulation::normalizer::normalize;
use crate::simulation::rules::evaluate;
use crate::simulation::SimulationError;

/// Outcome of a simulation over a raw series, with row accounting for logs
/// and metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRun {
    pub result: SimulationResult,
    pub rows_received: usize,
    pub rows_skipped: usize,
}

pub struct SimulationEngine;

impl SimulationEngine {
    /// Replay observations against the strategy in the order given
    pub fn run<I>(strategy: &Strategy, observations: I) -> SimulationResult
    where
        I: IntoIterator<Item = Observation>,
    {
        let ledger = observations
            .into_iter()
            .fold(Ledger::new(), |mut ledger, observation| {
                let signals = evaluate(&observation, strategy);
                if signals.buy || signals.sell {
                    debug!(
                        strategy_id = strategy.id,
                        date = %observation.date,
                        close = observation.close,
                        volume = observation.volume,
                        buy = signals.buy,
                        sell = signals.sell,
                        "Signal fired"
                    );
                }
                ledger.apply(&observation, signals);
                ledger
            });

        ledger.finish(strategy.id)
    }

    /// Validate a raw JSON series and simulate over its well-formed rows.
    ///
    /// Fails only when the series is missing or not a list.
    pub fn simulate(strategy: &Strategy, raw: &Value) -> Result<SimulationRun, SimulationError> {
        let rows_received = raw.as_array().map_or(0, Vec::len);
        let mut rows_used = 0usize;
        let observations = normalize(raw)?.inspect(|_| rows_used += 1);
        let result = Self::run(strategy, observations);

        Ok(SimulationRun {
            result,
            rows_received,
            rows_skipped: rows_received - rows_used,
        })
    }
}
