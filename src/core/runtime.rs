//! Apalis worker setup for strategy update notifications

use crate::jobs::context::JobContext;
use crate::jobs::handlers;
use crate::jobs::types::StrategyEvent;
use apalis::prelude::*;
use apalis_redis::RedisStorage;
use std::sync::Arc;
use tracing::info;

/// Configuration for the job runtime
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub concurrency: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// Runs one Apalis worker per unit of concurrency, all draining the same queue
pub struct NotificationRuntime {
    job_context: Arc<JobContext>,
    storage: RedisStorage<StrategyEvent>,
    concurrency: usize,
}

impl NotificationRuntime {
    pub fn new(
        config: RuntimeConfig,
        job_context: Arc<JobContext>,
        storage: RedisStorage<StrategyEvent>,
    ) -> Self {
        Self {
            job_context,
            storage,
            concurrency: config.concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Start all workers and return handles for graceful shutdown
    pub fn start_workers(&self) -> Vec<tokio::task::JoinHandle<()>> {
        info!(
            concurrency = self.concurrency,
            "NotificationRuntime: starting {} Apalis workers",
            self.concurrency
        );

        (0..self.concurrency)
            .map(|index| {
                let storage = self.storage.clone();
                let job_context = self.job_context.clone();
                tokio::spawn(async move {
                    let worker = WorkerBuilder::new(format!("strategy-events-worker-{}", index))
                        .data(job_context)
                        .backend(storage)
                        .build_fn(handlers::handle_strategy_event);

                    info!(index = index, "NotificationRuntime: worker started");
                    worker.run().await;
                })
            })
            .collect()
    }
}
