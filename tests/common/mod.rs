//! Shared test harness: in-memory SQLite, static quotes, and an app
//! spawned on a random port driven with reqwest.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use stocksim::api::routes::{app_router, AppState};
use stocksim::quotes::StaticQuoteProvider;
use stocksim::trade::CostBasisMode;
use tokio::sync::RwLock;

pub const STARTING_CASH: i64 = 1_000_000; // $10,000.00

/// In-memory SQLite with migrations applied. Single connection so every
/// statement sees the same database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    stocksim::persistence::run_migrations(&pool).await.unwrap();
    pool
}

pub async fn test_state(cost_basis: CostBasisMode) -> (AppState, Arc<StaticQuoteProvider>) {
    let quotes = Arc::new(StaticQuoteProvider::new());
    let state = AppState {
        db: test_pool().await,
        quotes: quotes.clone(),
        sessions: Arc::new(RwLock::new(HashSet::new())),
        jwt_secret: b"test-jwt-secret".to_vec(),
        starting_cash: STARTING_CASH,
        cost_basis,
    };
    (state, quotes)
}

/// Spawn app on a random port and return (base_url, guard that keeps server running).
pub async fn spawn_app(state: AppState) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);
    let app = app_router(state);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (base_url, handle)
}

/// Register a fresh user and log them in, returning the session token.
pub async fn register_and_login(
    client: &reqwest::Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> String {
    let res = client
        .post(format!("{}/register", base_url))
        .form(&[
            ("username", username),
            ("password", password),
            ("confirmation", password),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201);

    let res = client
        .post(format!("{}/login", base_url))
        .form(&[("username", username), ("password", password)])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let json: serde_json::Value = res.json().await.unwrap();
    json["token"].as_str().unwrap().to_string()
}

/// Portfolio snapshot from GET / as raw JSON.
pub async fn portfolio(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
) -> serde_json::Value {
    let res = client
        .get(format!("{}/", base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    res.json().await.unwrap()
}
