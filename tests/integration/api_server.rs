//! Integration tests for the API Server
//!
//! Tests HTTP endpoints, authentication, strategy ownership, caching and
//! simulation.


use axum::http::header::AUTHORIZATION;
use axum::http::HeaderValue;
use serde_json::{json, Value};
use stratlab::jobs::types::StrategyAction;

use test_utils::{scenario_series, strategy_payload, TestApiServer};

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["service"], "stratlab-api");
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApiServer::new().await;
    for _ in 0..3 {
        let _ = app.server.get("/health").await;
    }

    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    assert!(body.contains("http_requests_total"));
    assert!(body.contains("http_request_duration_seconds"));
    assert!(body.contains("simulations_total"));
    assert!(app.metrics.http_requests_total.get() >= 3);
}

// Auth

#[tokio::test]
async fn register_requires_username_and_password() {
    let app = TestApiServer::new().await;

    for body in [
        json!({}),
        json!({"username": "alice"}),
        json!({"password": "x"}),
        json!({"username": "", "password": "x"}),
    ] {
        let response = app.server.post("/auth/register").json(&body).await;
        assert_eq!(response.status_code(), 400);
        let body: Value = response.json();
        assert_eq!(body["message"], "Username and password are required");
    }

    let response = app.server.post("/auth/register").text("not json").await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let app = TestApiServer::new().await;
    let credentials = json!({"username": "alice", "password": "pw"});

    let response = app.server.post("/auth/register").json(&credentials).await;
    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["message"], "User registered successfully");

    let response = app.server.post("/auth/register").json(&credentials).await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], "Username already exists");
}

#[tokio::test]
async fn register_rejects_overlong_username() {
    let app = TestApiServer::new().await;

    let credentials = json!({"username": "u".repeat(101), "password": "pw"});
    let response = app.server.post("/auth/register").json(&credentials).await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], "Username must be at most 100 characters");

    let credentials = json!({"username": "u".repeat(100), "password": "pw"});
    let response = app.server.post("/auth/register").json(&credentials).await;
    assert_eq!(response.status_code(), 201);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = TestApiServer::new().await;
    let _ = app.login_as("alice").await;

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({"username": "alice", "password": "wrong"}))
        .await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid credentials");

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({"username": "nobody", "password": "wrong"}))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApiServer::new().await;

    let response = app.server.get("/strategies").await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["message"], "Missing authorization header");

    let response = app
        .server
        .get("/strategies")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Token abc"))
        .await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid authorization format");

    let response = app
        .server
        .get("/strategies")
        .authorization_bearer("not.a.jwt")
        .await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid or expired token");
}

// Strategy CRUD

#[tokio::test]
async fn create_and_fetch_strategy() {
    let app = TestApiServer::new().await;
    let token = app.login_as("alice").await;

    let response = app
        .server
        .post("/strategies")
        .authorization_bearer(&token)
        .json(&strategy_payload("Breakout"))
        .await;
    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["message"], "Strategy created successfully");
    let id = body["id"].as_i64().unwrap();

    let response = app
        .server
        .get(&format!("/strategies/{}", id))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["id"], id);
    assert_eq!(body["name"], "Breakout");
    assert_eq!(body["status"], "active");
    assert_eq!(body["buy_conditions"]["indicator"], "momentum");
    assert_eq!(body["sell_conditions"]["threshold"], 90.0);
}

#[tokio::test]
async fn create_rejects_invalid_payload() {
    let app = TestApiServer::new().await;
    let token = app.login_as("alice").await;

    let mut missing_name = strategy_payload("x");
    missing_name.as_object_mut().unwrap().remove("name");
    let mut bad_status = strategy_payload("x");
    bad_status["status"] = json!("paused");
    let mut unknown_field = strategy_payload("x");
    unknown_field["leverage"] = json!(10);

    for payload in [missing_name, bad_status, unknown_field] {
        let response = app
            .server
            .post("/strategies")
            .authorization_bearer(&token)
            .json(&payload)
            .await;
        assert_eq!(response.status_code(), 400, "payload {} accepted", payload);
    }
    assert!(app.notifier.events().is_empty());
}

#[tokio::test]
async fn create_rejects_overlong_fields() {
    let app = TestApiServer::new().await;
    let token = app.login_as("alice").await;

    let long_name = strategy_payload(&"n".repeat(150));
    let mut long_description = strategy_payload("x");
    long_description["description"] = json!("d".repeat(201));
    let mut long_asset_type = strategy_payload("x");
    long_asset_type["asset_type"] = json!("a".repeat(51));

    for payload in [long_name, long_description, long_asset_type] {
        let response = app
            .server
            .post("/strategies")
            .authorization_bearer(&token)
            .json(&payload)
            .await;
        assert_eq!(response.status_code(), 400);
        let body: Value = response.json();
        let message = body["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("Invalid strategy:"), "unexpected message {}", message);
    }
    assert!(app.notifier.events().is_empty());

    let list = app.server.get("/strategies").authorization_bearer(&token).await;
    let body: Vec<Value> = list.json();
    assert!(body.is_empty());
}

#[tokio::test]
async fn list_returns_only_callers_strategies() {
    let app = TestApiServer::new().await;
    let alice = app.login_as("alice").await;
    let bob = app.login_as("bob").await;

    app.create_strategy(&alice, &strategy_payload("A1")).await;
    app.create_strategy(&alice, &strategy_payload("A2")).await;
    app.create_strategy(&bob, &strategy_payload("B1")).await;

    let response = app.server.get("/strategies").authorization_bearer(&alice).await;
    assert_eq!(response.status_code(), 200);
    let body: Vec<Value> = response.json();
    let names: Vec<&str> = body.iter().filter_map(|s| s["name"].as_str()).collect();
    assert_eq!(names, vec!["A1", "A2"]);
}

#[tokio::test]
async fn foreign_strategy_is_forbidden() {
    let app = TestApiServer::new().await;
    let alice = app.login_as("alice").await;
    let bob = app.login_as("bob").await;
    let id = app.create_strategy(&alice, &strategy_payload("Mine")).await;
    let path = format!("/strategies/{}", id);

    let response = app.server.get(&path).authorization_bearer(&bob).await;
    assert_eq!(response.status_code(), 403);

    let response = app
        .server
        .put(&path)
        .authorization_bearer(&bob)
        .json(&strategy_payload("Stolen"))
        .await;
    assert_eq!(response.status_code(), 403);
    let body: Value = response.json();
    assert_eq!(body["message"], "You can only update your own strategies");

    let response = app.server.delete(&path).authorization_bearer(&bob).await;
    assert_eq!(response.status_code(), 403);
    let body: Value = response.json();
    assert_eq!(body["message"], "You can only delete your own strategies");

    let response = app
        .server
        .post(&format!("{}/simulate", path))
        .authorization_bearer(&bob)
        .json(&scenario_series())
        .await;
    assert_eq!(response.status_code(), 403);
    let body: Value = response.json();
    assert_eq!(body["message"], "You can only simulate your own strategies");
}

#[tokio::test]
async fn missing_strategy_is_not_found() {
    let app = TestApiServer::new().await;
    let token = app.login_as("alice").await;

    let response = app.server.get("/strategies/999").authorization_bearer(&token).await;
    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["message"], "Strategy not found");

    // Existence is checked before the body
    let response = app
        .server
        .put("/strategies/999")
        .authorization_bearer(&token)
        .json(&json!({"bogus": true}))
        .await;
    assert_eq!(response.status_code(), 404);

    let response = app.server.delete("/strategies/999").authorization_bearer(&token).await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn update_and_delete_strategy() {
    let app = TestApiServer::new().await;
    let token = app.login_as("alice").await;
    let id = app.create_strategy(&token, &strategy_payload("Before")).await;
    let path = format!("/strategies/{}", id);

    let mut updated = strategy_payload("After");
    updated["status"] = json!("inactive");
    let response = app.server.put(&path).authorization_bearer(&token).json(&updated).await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["message"], "Strategy updated successfully");

    let body: Value = app.server.get(&path).authorization_bearer(&token).await.json();
    assert_eq!(body["name"], "After");
    assert_eq!(body["status"], "inactive");

    let response = app.server.delete(&path).authorization_bearer(&token).await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["message"], "Strategy deleted successfully");

    let response = app.server.get(&path).authorization_bearer(&token).await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn update_validates_payload_after_ownership() {
    let app = TestApiServer::new().await;
    let token = app.login_as("alice").await;
    let id = app.create_strategy(&token, &strategy_payload("Keep")).await;

    let response = app
        .server
        .put(&format!("/strategies/{}", id))
        .authorization_bearer(&token)
        .json(&json!({"name": "only a name"}))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn update_rejects_overlong_description() {
    let app = TestApiServer::new().await;
    let token = app.login_as("alice").await;
    let id = app.create_strategy(&token, &strategy_payload("Keep")).await;

    let mut payload = strategy_payload("Keep");
    payload["description"] = json!("d".repeat(201));
    let response = app
        .server
        .put(&format!("/strategies/{}", id))
        .authorization_bearer(&token)
        .json(&payload)
        .await;
    assert_eq!(response.status_code(), 400);

    let response = app
        .server
        .get(&format!("/strategies/{}", id))
        .authorization_bearer(&token)
        .await;
    let body: Value = response.json();
    assert_ne!(body["description"], json!("d".repeat(201)));
}

// Cache and notifications

#[tokio::test]
async fn list_is_cached_until_a_mutation() {
    let app = TestApiServer::new().await;
    let token = app.login_as("alice").await;
    app.create_strategy(&token, &strategy_payload("First")).await;

    let _ = app.server.get("/strategies").authorization_bearer(&token).await;
    assert_eq!(app.metrics.cache_misses_total.get(), 1);
    assert!(app.cache.contains(1).await);

    let response = app.server.get("/strategies").authorization_bearer(&token).await;
    let body: Vec<Value> = response.json();
    assert_eq!(body.len(), 1);
    assert_eq!(app.metrics.cache_hits_total.get(), 1);

    app.create_strategy(&token, &strategy_payload("Second")).await;
    assert!(!app.cache.contains(1).await);

    let body: Vec<Value> = app
        .server
        .get("/strategies")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(body.len(), 2);
    assert_eq!(app.metrics.cache_misses_total.get(), 2);
}

#[tokio::test]
async fn mutations_publish_strategy_events() {
    let app = TestApiServer::new().await;
    let token = app.login_as("alice").await;
    let id = app.create_strategy(&token, &strategy_payload("Evented")).await;
    let path = format!("/strategies/{}", id);

    let _ = app
        .server
        .put(&path)
        .authorization_bearer(&token)
        .json(&strategy_payload("Evented v2"))
        .await;
    let _ = app.server.delete(&path).authorization_bearer(&token).await;

    let actions: Vec<StrategyAction> = app.notifier.events().iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            StrategyAction::Created,
            StrategyAction::Updated,
            StrategyAction::Deleted
        ]
    );
    assert!(app
        .notifier
        .events()
        .iter()
        .all(|e| e.strategy_id == id && e.user_id == 1));
    assert_eq!(app.metrics.notifications_published_total.get(), 3);
}

// Simulation

#[tokio::test]
async fn simulate_returns_metrics() {
    let app = TestApiServer::new().await;
    let token = app.login_as("alice").await;
    let id = app.create_strategy(&token, &strategy_payload("Sim")).await;

    let response = app
        .server
        .post(&format!("/strategies/{}/simulate", id))
        .authorization_bearer(&token)
        .json(&scenario_series())
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["strategy_id"], id);
    assert_eq!(body["total_trades"], 2);
    assert_eq!(body["profit_loss"], -210.0);
    assert_eq!(body["win_rate"], 50.0);
    assert_eq!(body["max_drawdown"], 10.1);
    assert_eq!(app.metrics.simulations_total.get(), 1);
}

#[tokio::test]
async fn simulate_accepts_wrapped_series() {
    let app = TestApiServer::new().await;
    let token = app.login_as("alice").await;
    let id = app.create_strategy(&token, &strategy_payload("Sim")).await;

    let response = app
        .server
        .post(&format!("/strategies/{}/simulate", id))
        .authorization_bearer(&token)
        .json(&json!({ "historical_data": scenario_series() }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["total_trades"], 2);
}

#[tokio::test]
async fn simulate_requires_historical_data() {
    let app = TestApiServer::new().await;
    let token = app.login_as("alice").await;
    let id = app.create_strategy(&token, &strategy_payload("Sim")).await;
    let path = format!("/strategies/{}/simulate", id);

    for payload in [json!(null), json!({"rows": []}), json!("2023-01-01")] {
        let response = app
            .server
            .post(&path)
            .authorization_bearer(&token)
            .json(&payload)
            .await;
        assert_eq!(response.status_code(), 400);
        let body: Value = response.json();
        assert_eq!(body["message"], "historical data is required");
    }

    let response = app.server.post(&path).authorization_bearer(&token).await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(app.metrics.simulations_total.get(), 0);
}

#[tokio::test]
async fn simulate_skips_malformed_rows() {
    let app = TestApiServer::new().await;
    let token = app.login_as("alice").await;
    let id = app.create_strategy(&token, &strategy_payload("Sim")).await;

    let response = app
        .server
        .post(&format!("/strategies/{}/simulate", id))
        .authorization_bearer(&token)
        .json(&json!([
            { "date": "2023-01-01", "close": 101, "volume": 10 },
            { "date": "2023-01-01b", "volume": 99 },
            { "date": "2023-01-02", "close": 80, "volume": 10 }
        ]))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["profit_loss"], -210.0);
    assert_eq!(app.metrics.simulation_rows_skipped_total.get(), 1);
}

#[tokio::test]
async fn simulate_unknown_strategy_is_not_found() {
    let app = TestApiServer::new().await;
    let token = app.login_as("alice").await;

    let response = app
        .server
        .post("/strategies/42/simulate")
        .authorization_bearer(&token)
        .json(&scenario_series())
        .await;
    assert_eq!(response.status_code(), 404);
}
