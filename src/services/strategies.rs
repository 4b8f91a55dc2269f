//! Strategy CRUD with read-through caching and update notifications

use tracing::{debug, info, warn};

use crate::core::http::AppState;
use crate::error::{ApiError, ApiResult};
use crate::jobs::types::{StrategyAction, StrategyEvent};
use crate::models::strategy::{StrategyDraft, StrategyRecord};
use crate::models::user::User;

/// Schema check for create/update bodies
pub fn parse_draft(body: &[u8]) -> ApiResult<StrategyDraft> {
    let draft: StrategyDraft = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid strategy: {}", e)))?;
    draft
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Invalid strategy: {}", e)))?;
    Ok(draft)
}

/// Load a strategy and make sure `user` owns it.
///
/// `forbidden` is the message returned to a caller who does not.
pub async fn owned_strategy(
    state: &AppState,
    user: &User,
    id: i64,
    forbidden: &str,
) -> ApiResult<StrategyRecord> {
    let strategy = state
        .strategies
        .get_strategy(id)
        .await
        .map_err(|e| ApiError::internal("Failed to load strategy", e))?
        .ok_or_else(|| {
            debug!(strategy_id = id, "Strategy not found");
            ApiError::NotFound("Strategy not found".to_string())
        })?;

    if !strategy.is_owned_by(user.id) {
        warn!(
            strategy_id = id,
            user_id = user.id,
            owner_id = strategy.user_id,
            "User is not the owner of the strategy"
        );
        return Err(ApiError::Forbidden(forbidden.to_string()));
    }

    Ok(strategy)
}

/// Drop the owner's cached list and publish the change. Failures here are
/// logged and never undo the mutation.
async fn after_mutation(state: &AppState, user_id: i64, strategy_id: i64, action: StrategyAction) {
    if let Err(e) = state.cache.invalidate_user(user_id).await {
        warn!(user_id = user_id, error = %e, "Failed to invalidate strategy cache");
    }

    match state
        .notifier
        .publish(StrategyEvent::new(strategy_id, user_id, action))
        .await
    {
        Ok(()) => state.metrics.notifications_published_total.inc(),
        Err(e) => warn!(
            strategy_id = strategy_id,
            action = action.as_str(),
            error = %e,
            "Failed to publish strategy event"
        ),
    }
}

pub async fn create(state: &AppState, user: &User, draft: StrategyDraft) -> ApiResult<i64> {
    let id = state
        .strategies
        .create_strategy(user.id, &draft)
        .await
        .map_err(|e| ApiError::internal("Failed to create strategy", e))?;

    info!(strategy_id = id, user_id = user.id, name = %draft.name, "Strategy created");
    after_mutation(state, user.id, id, StrategyAction::Created).await;
    Ok(id)
}

/// The caller's strategies, served from cache when possible.
///
/// On a miss the list is cached only if no mutation invalidated the entry
/// while it was being loaded.
pub async fn list(state: &AppState, user: &User) -> ApiResult<Vec<StrategyRecord>> {
    let generation = match state.cache.generation(user.id).await {
        Ok(generation) => Some(generation),
        Err(e) => {
            warn!(user_id = user.id, error = %e, "Strategy cache generation read failed");
            None
        }
    };

    match state.cache.get_user_strategies(user.id).await {
        Ok(Some(cached)) => {
            state.metrics.cache_hits_total.inc();
            debug!(user_id = user.id, count = cached.len(), "Strategy list served from cache");
            return Ok(cached);
        }
        Ok(None) => state.metrics.cache_misses_total.inc(),
        Err(e) => {
            state.metrics.cache_misses_total.inc();
            warn!(user_id = user.id, error = %e, "Strategy cache read failed");
        }
    }

    let strategies = state
        .strategies
        .get_strategies_for_user(user.id)
        .await
        .map_err(|e| ApiError::internal("Failed to load strategies", e))?;

    if let Some(generation) = generation {
        match state
            .cache
            .put_user_strategies(user.id, generation, &strategies)
            .await
        {
            Ok(true) => {}
            Ok(false) => debug!(user_id = user.id, "Strategy list changed while loading, not cached"),
            Err(e) => warn!(user_id = user.id, error = %e, "Failed to cache strategy list"),
        }
    }

    Ok(strategies)
}

pub async fn get(state: &AppState, user: &User, id: i64) -> ApiResult<StrategyRecord> {
    owned_strategy(state, user, id, "You can only view your own strategies").await
}

/// Ownership is checked before the body is validated
pub async fn update(state: &AppState, user: &User, id: i64, body: &[u8]) -> ApiResult<()> {
    owned_strategy(state, user, id, "You can only update your own strategies").await?;
    let draft = parse_draft(body)?;

    let updated = state
        .strategies
        .update_strategy(id, &draft)
        .await
        .map_err(|e| ApiError::internal("Failed to update strategy", e))?;
    if !updated {
        return Err(ApiError::NotFound("Strategy not found".to_string()));
    }

    info!(strategy_id = id, user_id = user.id, "Strategy updated");
    after_mutation(state, user.id, id, StrategyAction::Updated).await;
    Ok(())
}

pub async fn delete(state: &AppState, user: &User, id: i64) -> ApiResult<()> {
    owned_strategy(state, user, id, "You can only delete your own strategies").await?;

    let deleted = state
        .strategies
        .delete_strategy(id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete strategy", e))?;
    if !deleted {
        return Err(ApiError::NotFound("Strategy not found".to_string()));
    }

    info!(strategy_id = id, user_id = user.id, "Strategy deleted");
    after_mutation(state, user.id, id, StrategyAction::Deleted).await;
    Ok(())
}
