//! Publishing of strategy update notifications.
//!
//! Events go onto an Apalis Redis queue consumed by the `worker` binary.
//! Publishing is a side effect: callers log failures instead of failing the
//! mutation that triggered them.

use apalis::prelude::*;
use apalis_redis::RedisStorage;
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

use crate::jobs::types::StrategyEvent;

pub type NotifyResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[async_trait]
pub trait StrategyNotifier: Send + Sync {
    async fn publish(&self, event: StrategyEvent) -> NotifyResult;
}

/// Pushes events onto the Redis-backed job queue
#[derive(Clone)]
pub struct QueueNotifier {
    storage: RedisStorage<StrategyEvent>,
}

impl QueueNotifier {
    pub fn new(storage: RedisStorage<StrategyEvent>) -> Self {
        Self { storage }
    }

    pub async fn connect(redis_url: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let conn = apalis_redis::connect(redis_url.to_string()).await?;
        Ok(Self::new(RedisStorage::new(conn)))
    }
}

#[async_trait]
impl StrategyNotifier for QueueNotifier {
    async fn publish(&self, event: StrategyEvent) -> NotifyResult {
        let mut storage = self.storage.clone();
        storage.push(event).await.map_err(|e| {
            Box::new(std::io::Error::other(format!(
                "Failed to enqueue StrategyEvent: {}",
                e
            ))) as Box<dyn std::error::Error + Send + Sync>
        })?;
        Ok(())
    }
}

/// Logs events only; used when the queue is unreachable
pub struct LogNotifier;

#[async_trait]
impl StrategyNotifier for LogNotifier {
    async fn publish(&self, event: StrategyEvent) -> NotifyResult {
        info!(
            strategy_id = event.strategy_id,
            user_id = event.user_id,
            action = event.action.as_str(),
            "Strategy event (queue disabled)"
        );
        Ok(())
    }
}

/// Keeps published events in memory for inspection
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<StrategyEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StrategyEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StrategyNotifier for RecordingNotifier {
    async fn publish(&self, event: StrategyEvent) -> NotifyResult {
        self.events
            .lock()
            .map_err(|_| "notification recorder poisoned")?
            .push(event);
        Ok(())
    }
}
