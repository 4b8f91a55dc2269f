//! Job types carried on the strategy update queue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyAction {
    Created,
    Updated,
    Deleted,
}

impl StrategyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyAction::Created => "created",
            StrategyAction::Updated => "updated",
            StrategyAction::Deleted => "deleted",
        }
    }
}

/// Published after every successful strategy mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyEvent {
    pub strategy_id: i64,
    pub user_id: i64,
    pub action: StrategyAction,
    pub occurred_at: DateTime<Utc>,
}

impl StrategyEvent {
    pub fn new(strategy_id: i64, user_id: i64, action: StrategyAction) -> Self {
        Self {
            strategy_id,
            user_id,
            action,
            occurred_at: Utc::now(),
        }
    }
}
