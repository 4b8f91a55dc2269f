//! Persistence for users and strategies

pub mod memory;
pub mod postgres;

pub use memory::InMemoryDatabase;
pub use postgres::PostgresDatabase;

use async_trait::async_trait;

use crate::models::strategy::{StrategyDraft, StrategyRecord};
use crate::models::user::User;

pub type DbResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; `None` when the username is already taken
    async fn create_user(&self, username: &str, password_hash: &str) -> DbResult<Option<i64>>;

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>>;
}

#[async_trait]
pub trait StrategyRepository: Send + Sync {
    async fn create_strategy(&self, user_id: i64, draft: &StrategyDraft) -> DbResult<i64>;

    async fn get_strategy(&self, id: i64) -> DbResult<Option<StrategyRecord>>;

    /// All strategies of one owner, oldest first
    async fn get_strategies_for_user(&self, user_id: i64) -> DbResult<Vec<StrategyRecord>>;

    /// `false` when no strategy has this id
    async fn update_strategy(&self, id: i64, draft: &StrategyDraft) -> DbResult<bool>;

    /// `false` when no strategy has this id
    async fn delete_strategy(&self, id: i64) -> DbResult<bool>;
}
