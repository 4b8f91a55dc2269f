//! Redis-backed strategy cache

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{user_generation_key, user_strategies_key, CacheResult, StrategyCache};
use crate::models::strategy::StrategyRecord;

const CONNECT_ATTEMPTS: usize = 3;

// KEYS[1] list, KEYS[2] generation; ARGV[1] expected generation, ARGV[2]
// payload, ARGV[3] ttl seconds
const PUT_IF_GENERATION: &str = r#"
local current = redis.call('GET', KEYS[2]) or '0'
if current ~= ARGV[1] then
    return 0
end
redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
return 1
"#;

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisCache {
    pub async fn connect(redis_url: &str, ttl_seconds: u64) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = (|| ConnectionManager::new(client.clone()))
            .retry(ExponentialBuilder::default().with_max_times(CONNECT_ATTEMPTS))
            .notify(|e: &redis::RedisError, delay: Duration| {
                warn!(error = %e, delay_ms = delay.as_millis() as u64, "Redis connection failed, retrying");
            })
            .await?;

        Ok(Self { conn, ttl_seconds })
    }
}

#[async_trait]
impl StrategyCache for RedisCache {
    async fn get_user_strategies(&self, user_id: i64) -> CacheResult<Option<Vec<StrategyRecord>>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(user_strategies_key(user_id)).await?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn generation(&self, user_id: i64) -> CacheResult<u64> {
        let mut conn = self.conn.clone();
        let generation: Option<u64> = conn.get(user_generation_key(user_id)).await?;
        Ok(generation.unwrap_or(0))
    }

    async fn put_user_strategies(
        &self,
        user_id: i64,
        generation: u64,
        strategies: &[StrategyRecord],
    ) -> CacheResult<bool> {
        let payload = serde_json::to_string(strategies)?;
        let mut conn = self.conn.clone();
        let stored: i64 = Script::new(PUT_IF_GENERATION)
            .key(user_strategies_key(user_id))
            .key(user_generation_key(user_id))
            .arg(generation)
            .arg(payload)
            .arg(self.ttl_seconds)
            .invoke_async(&mut conn)
            .await?;

        if stored == 1 {
            debug!(user_id = user_id, count = strategies.len(), "Cached strategy list");
        } else {
            debug!(
                user_id = user_id,
                generation = generation,
                "Strategy list invalidated meanwhile, not cached"
            );
        }
        Ok(stored == 1)
    }

    async fn invalidate_user(&self, user_id: i64) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .del(user_strategies_key(user_id))
            .ignore()
            .incr(user_generation_key(user_id), 1)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}
