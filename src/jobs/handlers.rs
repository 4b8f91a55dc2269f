//! Job handlers for strategy update notifications

use crate::jobs::context::JobContext;
use crate::jobs::types::StrategyEvent;
use apalis::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Apalis entry point for `StrategyEvent` jobs
pub async fn handle_strategy_event(
    job: StrategyEvent,
    ctx: Data<Arc<JobContext>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    process_strategy_event(&ctx, &job).await
}

/// Record the notification and re-warm the owner's strategy list cache.
///
/// The cache entry is dropped when the owner has no strategies left.
pub async fn process_strategy_event(
    ctx: &JobContext,
    event: &StrategyEvent,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!(
        strategy_id = event.strategy_id,
        user_id = event.user_id,
        action = event.action.as_str(),
        occurred_at = %event.occurred_at,
        "StrategyEvent: strategy {} {}",
        event.strategy_id,
        event.action.as_str()
    );

    let generation = ctx.cache.generation(event.user_id).await?;
    let strategies = ctx
        .strategies
        .get_strategies_for_user(event.user_id)
        .await
        .map_err(|e| {
            Box::new(std::io::Error::other(format!(
                "Failed to load strategies for user {}: {}",
                event.user_id, e
            ))) as Box<dyn std::error::Error + Send + Sync>
        })?;

    if strategies.is_empty() {
        ctx.cache.invalidate_user(event.user_id).await?;
        debug!(user_id = event.user_id, "StrategyEvent: no strategies left, cache entry dropped");
    } else {
        let stored = ctx
            .cache
            .put_user_strategies(event.user_id, generation, &strategies)
            .await?;
        debug!(
            user_id = event.user_id,
            count = strategies.len(),
            stored = stored,
            "StrategyEvent: re-warmed cache with {} strategies",
            strategies.len()
        );
    }

    if let Some(ref metrics) = ctx.metrics {
        metrics.notifications_processed_total.inc();
    }

    Ok(())
}
