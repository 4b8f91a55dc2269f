//! Running a stored strategy against a caller-supplied series

use serde_json::Value;
use std::time::Instant;
use tracing::info;

use crate::core::http::AppState;
use crate::error::ApiResult;
use crate::models::simulation::SimulationResult;
use crate::models::user::User;
use crate::services::strategies::owned_strategy;
use crate::simulation::SimulationEngine;

/// Extract the historical series from a request body.
///
/// The body is normally the series itself; `{"historical_data": [...]}` is
/// unwrapped. Empty or invalid JSON becomes `Null`, which the engine rejects.
pub fn historical_series(body: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut fields)) => fields
            .remove("historical_data")
            .unwrap_or(Value::Object(fields)),
        Ok(value) => value,
        Err(_) => Value::Null,
    }
}

pub async fn simulate(
    state: &AppState,
    user: &User,
    id: i64,
    body: &[u8],
) -> ApiResult<SimulationResult> {
    info!(strategy_id = id, user_id = user.id, "Simulating strategy");

    let record = owned_strategy(state, user, id, "You can only simulate your own strategies").await?;
    let series = historical_series(body);

    let start = Instant::now();
    let run = SimulationEngine::simulate(&record.definition(), &series)?;
    let elapsed = start.elapsed();

    state.metrics.simulations_total.inc();
    state
        .metrics
        .simulation_duration_seconds
        .observe(elapsed.as_secs_f64());
    state
        .metrics
        .simulation_rows_skipped_total
        .inc_by(run.rows_skipped as u64);

    info!(
        strategy_id = id,
        user_id = user.id,
        rows = run.rows_received,
        skipped = run.rows_skipped,
        total_trades = run.result.total_trades,
        profit_loss = run.result.profit_loss,
        win_rate = run.result.win_rate,
        max_drawdown = run.result.max_drawdown,
        duration_us = elapsed.as_micros() as u64,
        "Simulation complete"
    );

    Ok(run.result)
}
