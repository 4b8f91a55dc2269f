//! Stratlab Worker
//!
//! Consumes strategy update events from the Redis queue and re-warms the
//! per-user strategy list cache. Runs as a separate process from the API.

use apalis_redis::RedisStorage;
use dotenvy::dotenv;
use std::sync::Arc;
use stratlab::cache::redis_cache::RedisCache;
use stratlab::cache::StrategyCache;
use stratlab::config::{AppConfig, StorageBackend};
use stratlab::core::runtime::{NotificationRuntime, RuntimeConfig};
use stratlab::db::postgres::PostgresDatabase;
use stratlab::jobs::context::JobContext;
use stratlab::jobs::types::StrategyEvent;
use stratlab::logging;
use stratlab::metrics::Metrics;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    logging::init_logging();

    let config = AppConfig::from_env();
    info!("Starting Stratlab Worker");
    info!(environment = %config.environment, "Environment");

    if config.storage == StorageBackend::Memory {
        return Err("Worker requires PostgreSQL storage; STORAGE=memory is API-only".into());
    }

    let metrics = Arc::new(
        Metrics::new().map_err(|e| format!("Failed to register metrics: {}", e))?,
    );

    info!("Initializing PostgreSQL connection...");
    let database = PostgresDatabase::connect(&config.database_url)
        .await
        .map_err(|e| format!("PostgreSQL connection required for worker: {}", e))?;
    metrics.database_connected.set(1.0);
    info!("PostgreSQL connected");

    info!("Initializing Redis cache...");
    let cache: Arc<dyn StrategyCache> = Arc::new(
        RedisCache::connect(&config.redis_url, config.cache_ttl_seconds)
            .await
            .map_err(|e| format!("Redis connection required for worker: {}", e))?,
    );
    metrics.cache_connected.set(1.0);
    info!("Redis connected");

    info!("Initializing Apalis Redis storage...");
    let conn = apalis_redis::connect(config.redis_url.clone()).await?;
    let storage: RedisStorage<StrategyEvent> = RedisStorage::new(conn);
    info!("Apalis Redis storage initialized");

    let job_context = Arc::new(JobContext::new(
        Arc::new(database),
        cache,
        Some(metrics.clone()),
    ));

    let runtime = NotificationRuntime::new(
        RuntimeConfig {
            concurrency: config.worker_concurrency,
        },
        job_context,
        storage,
    );
    info!(concurrency = runtime.concurrency(), "Worker concurrency: {}", runtime.concurrency());
    let worker_handles = runtime.start_workers();

    info!("Worker started, waiting for shutdown signal...");
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }

    info!("Shutting down worker...");
    for handle in worker_handles {
        handle.abort();
    }
    info!("Worker stopped");

    Ok(())
}
