//! HTTP endpoint server using Axum

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

use crate::auth::{AuthConfig, AuthUser};
use crate::cache::memory::NoopCache;
use crate::cache::redis_cache::RedisCache;
use crate::cache::StrategyCache;
use crate::config::{AppConfig, StorageBackend};
use crate::db::memory::InMemoryDatabase;
use crate::db::postgres::PostgresDatabase;
use crate::db::{StrategyRepository, UserRepository};
use crate::error::ApiResult;
use crate::metrics::Metrics;
use crate::models::simulation::SimulationResult;
use crate::models::strategy::{Condition, StrategyRecord, StrategyStatus};
use crate::notifications::{LogNotifier, QueueNotifier, StrategyNotifier};
use crate::services::{self, auth::Credentials};

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub users: Arc<dyn UserRepository>,
    pub strategies: Arc<dyn StrategyRepository>,
    pub cache: Arc<dyn StrategyCache>,
    pub notifier: Arc<dyn StrategyNotifier>,
    pub auth: Arc<AuthConfig>,
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "stratlab-api"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();

    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();

    state.metrics.http_requests_in_flight.dec();
    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

#[derive(Debug, Serialize)]
pub struct StrategyResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub asset_type: String,
    pub buy_conditions: Condition,
    pub sell_conditions: Condition,
    pub status: StrategyStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<StrategyRecord> for StrategyResponse {
    fn from(strategy: StrategyRecord) -> Self {
        Self {
            id: strategy.id,
            name: strategy.name,
            description: strategy.description,
            asset_type: strategy.asset_type,
            buy_conditions: strategy.buy_conditions,
            sell_conditions: strategy.sell_conditions,
            status: strategy.status,
            created_at: strategy.created_at,
            updated_at: strategy.updated_at,
        }
    }
}

async fn register(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    services::auth::register(&state, Credentials::from_body(&body)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

async fn login(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let token = services::auth::login(&state, Credentials::from_body(&body)).await?;
    Ok(Json(json!({ "access_token": token })))
}

/// List the caller's strategies
async fn list_strategies(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<StrategyResponse>>> {
    let strategies = services::strategies::list(&state, &user).await?;
    Ok(Json(strategies.into_iter().map(Into::into).collect()))
}

async fn create_strategy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let draft = services::strategies::parse_draft(&body)?;
    let id = services::strategies::create(&state, &user, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Strategy created successfully", "id": id })),
    ))
}

async fn get_strategy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<StrategyResponse>> {
    let strategy = services::strategies::get(&state, &user, id).await?;
    Ok(Json(strategy.into()))
}

async fn update_strategy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    services::strategies::update(&state, &user, id, &body).await?;
    Ok(Json(json!({ "message": "Strategy updated successfully" })))
}

async fn delete_strategy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    services::strategies::delete(&state, &user, id).await?;
    Ok(Json(json!({ "message": "Strategy deleted successfully" })))
}

async fn simulate_strategy(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult<Json<SimulationResult>> {
    let result = services::simulation::simulate(&state, &user, id, &body).await?;
    Ok(Json(result))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/strategies", get(list_strategies).post(create_strategy))
        .route(
            "/strategies/{id}",
            get(get_strategy).put(update_strategy).delete(delete_strategy),
        )
        .route("/strategies/{id}/simulate", post(simulate_strategy))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Wire storage, cache and notifier from configuration.
///
/// Postgres must be reachable unless `STORAGE=memory`. Redis is optional:
/// without it the list cache is disabled and events are only logged.
pub async fn build_state(
    config: &AppConfig,
) -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    let jwt_secret = config
        .jwt_secret
        .clone()
        .ok_or("JWT_SECRET_KEY must be set")?;
    let auth = AuthConfig::new(jwt_secret).with_expiry_hours(config.jwt_expiry_hours);
    let metrics = Arc::new(Metrics::new().map_err(|e| format!("Failed to register metrics: {}", e))?);

    let (users, strategies): (Arc<dyn UserRepository>, Arc<dyn StrategyRepository>) =
        match config.storage {
            StorageBackend::Postgres => {
                let db = Arc::new(PostgresDatabase::connect(&config.database_url).await?);
                info!("PostgreSQL connected for API server");
                let users: Arc<dyn UserRepository> = db.clone();
                let strategies: Arc<dyn StrategyRepository> = db;
                (users, strategies)
            }
            StorageBackend::Memory => {
                warn!("Using in-memory storage, data will not survive a restart");
                let db = Arc::new(InMemoryDatabase::new());
                let users: Arc<dyn UserRepository> = db.clone();
                let strategies: Arc<dyn StrategyRepository> = db;
                (users, strategies)
            }
        };
    metrics.database_connected.set(1.0);

    let cache: Arc<dyn StrategyCache> =
        match RedisCache::connect(&config.redis_url, config.cache_ttl_seconds).await {
            Ok(cache) => {
                info!("Redis connected for strategy cache");
                metrics.cache_connected.set(1.0);
                Arc::new(cache)
            }
            Err(e) => {
                warn!(error = %e, "Failed to connect to Redis - strategy cache disabled");
                Arc::new(NoopCache)
            }
        };

    let notifier: Arc<dyn StrategyNotifier> = match QueueNotifier::connect(&config.redis_url).await
    {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            warn!(error = %e, "Failed to connect job queue - strategy events will only be logged");
            Arc::new(LogNotifier)
        }
    };

    Ok(AppState {
        health: Arc::new(RwLock::new(HealthStatus::default())),
        metrics,
        start_time: Arc::new(Instant::now()),
        users,
        strategies,
        cache,
        notifier,
        auth: Arc::new(auth),
    })
}

pub async fn start_server(
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = build_state(config).await?;
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!(port = config.port, "HTTP server listening on port {}", config.port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        config.port
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
