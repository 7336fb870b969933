use std::collections::HashSet;
use std::sync::Arc;

use stocksim::api::routes::{app_router, AppState};
use stocksim::config::Config;
use stocksim::persistence;
use stocksim::quotes::HttpQuoteProvider;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let db = persistence::create_pool_and_migrate(&config.database_url).await?;

    let app_state = AppState {
        db,
        quotes: Arc::new(HttpQuoteProvider::new(config.quote_api_url.clone())),
        sessions: Arc::new(RwLock::new(HashSet::new())),
        jwt_secret: config.jwt_secret.clone().into_bytes(),
        starting_cash: config.starting_cash,
        cost_basis: config.cost_basis,
    };

    let app = app_router(app_state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
