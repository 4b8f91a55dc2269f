//! In-process storage for local runs and tests

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::db::{DbResult, StrategyRepository, UserRepository};
use crate::models::strategy::{StrategyDraft, StrategyRecord};
use crate::models::user::User;

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    strategies: BTreeMap<i64, StrategyRecord>,
    next_user_id: i64,
    next_strategy_id: i64,
}

/// Map-backed repository with sequential ids starting at 1
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: RwLock<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryDatabase {
    async fn create_user(&self, username: &str, password_hash: &str) -> DbResult<Option<i64>> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == username) {
            return Ok(None);
        }

        tables.next_user_id += 1;
        let id = tables.next_user_id;
        tables.users.insert(
            id,
            User {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(Some(id))
    }

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl StrategyRepository for InMemoryDatabase {
    async fn create_strategy(&self, user_id: i64, draft: &StrategyDraft) -> DbResult<i64> {
        let mut tables = self.tables.write().await;
        tables.next_strategy_id += 1;
        let id = tables.next_strategy_id;
        tables.strategies.insert(
            id,
            StrategyRecord::from_draft(id, user_id, draft.clone(), Utc::now()),
        );
        Ok(id)
    }

    async fn get_strategy(&self, id: i64) -> DbResult<Option<StrategyRecord>> {
        Ok(self.tables.read().await.strategies.get(&id).cloned())
    }

    async fn get_strategies_for_user(&self, user_id: i64) -> DbResult<Vec<StrategyRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .strategies
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_strategy(&self, id: i64, draft: &StrategyDraft) -> DbResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.strategies.get_mut(&id) {
            Some(strategy) => {
                strategy.apply_draft(draft.clone(), Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_strategy(&self, id: i64) -> DbResult<bool> {
        Ok(self.tables.write().await.strategies.remove(&id).is_some())
    }
}
