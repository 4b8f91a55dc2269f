//! Per-user strategy list cache.
//!
//! The HTTP layer reads through it and invalidates it on mutation. The
//! simulation engine never sees it.

pub mod memory;
pub mod redis_cache;

pub use self::memory::{InMemoryCache, NoopCache};
pub use self::redis_cache::RedisCache;

use async_trait::async_trait;

use crate::models::strategy::StrategyRecord;

pub type CacheResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub fn user_strategies_key(user_id: i64) -> String {
    format!("user_strategies:{}", user_id)
}

/// Counter bumped on every invalidation of a user's entry
pub fn user_generation_key(user_id: i64) -> String {
    format!("user_strategies_gen:{}", user_id)
}

/// Read-through writers take `generation` before loading from the database
/// and hand it to `put_user_strategies`, which refuses the write when the
/// entry was invalidated in between. A slow reader can then never cache a
/// list older than a concurrent mutation.
#[async_trait]
pub trait StrategyCache: Send + Sync {
    /// Cached list for the user, `None` on a miss
    async fn get_user_strategies(&self, user_id: i64) -> CacheResult<Option<Vec<StrategyRecord>>>;

    async fn generation(&self, user_id: i64) -> CacheResult<u64>;

    /// Store the list unless the entry was invalidated since `generation`.
    /// Returns whether the list was stored.
    async fn put_user_strategies(
        &self,
        user_id: i64,
        generation: u64,
        strategies: &[StrategyRecord],
    ) -> CacheResult<bool>;

    async fn invalidate_user(&self, user_id: i64) -> CacheResult<()>;
}
