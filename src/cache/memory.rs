//! Process-local caches: a map-backed one for tests and single-node runs,
//! and one that always misses for when Redis is unreachable.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::cache::{CacheResult, StrategyCache};
use crate::models::strategy::StrategyRecord;

#[derive(Default)]
struct Entries {
    lists: HashMap<i64, Vec<StrategyRecord>>,
    generations: HashMap<i64, u64>,
}

/// Process-local cache without expiry, used in tests and single-node runs
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<Entries>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, user_id: i64) -> bool {
        self.entries.read().await.lists.contains_key(&user_id)
    }
}

#[async_trait]
impl StrategyCache for InMemoryCache {
    async fn get_user_strategies(&self, user_id: i64) -> CacheResult<Option<Vec<StrategyRecord>>> {
        Ok(self.entries.read().await.lists.get(&user_id).cloned())
    }

    async fn generation(&self, user_id: i64) -> CacheResult<u64> {
        Ok(self
            .entries
            .read()
            .await
            .generations
            .get(&user_id)
            .copied()
            .unwrap_or(0))
    }

    async fn put_user_strategies(
        &self,
        user_id: i64,
        generation: u64,
        strategies: &[StrategyRecord],
    ) -> CacheResult<bool> {
        let mut entries = self.entries.write().await;
        let current = entries.generations.get(&user_id).copied().unwrap_or(0);
        if current != generation {
            return Ok(false);
        }
        entries.lists.insert(user_id, strategies.to_vec());
        Ok(true)
    }

    async fn invalidate_user(&self, user_id: i64) -> CacheResult<()> {
        let mut entries = self.entries.write().await;
        entries.lists.remove(&user_id);
        *entries.generations.entry(user_id).or_insert(0) += 1;
        Ok(())
    }
}

/// Always misses; stands in when Redis is unreachable
pub struct NoopCache;

#[async_trait]
impl StrategyCache for NoopCache {
    async fn get_user_strategies(&self, _user_id: i64) -> CacheResult<Option<Vec<StrategyRecord>>> {
        Ok(None)
    }

    async fn generation(&self, _user_id: i64) -> CacheResult<u64> {
        Ok(0)
    }

    async fn put_user_strategies(
        &self,
        _user_id: i64,
        _generation: u64,
        _strategies: &[StrategyRecord],
    ) -> CacheResult<bool> {
        Ok(false)
    }

    async fn invalidate_user(&self, _user_id: i64) -> CacheResult<()> {
        Ok(())
    }
}
