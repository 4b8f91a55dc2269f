//! Stratlab API Server
//!
//! HTTP API for accounts, strategy CRUD and backtest simulation.
//! Strategy update events are consumed by the separate `worker` process.

use dotenvy::dotenv;
use stratlab::config::AppConfig;
use stratlab::core::http::start_server;
use stratlab::logging;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    logging::init_logging();

    let config = AppConfig::from_env();
    info!("Starting Stratlab API Server");
    info!(environment = %config.environment, "Environment");
    info!(storage = ?config.storage, "Storage backend");
    info!(port = config.port, "HTTP Server: http://0.0.0.0:{}", config.port);

    if config.jwt_secret.is_none() {
        error!("JWT_SECRET_KEY is not set - refusing to start");
        return Err("JWT_SECRET_KEY must be set".into());
    }

    if let Err(e) = start_server(&config).await {
        error!(error = %e, "HTTP server error");
        return Err(e);
    }

    info!("API server stopped");
    Ok(())
}
