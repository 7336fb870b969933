//! HTTP surface: registration, login/logout, quote, buy/sell, history,
//! and the portfolio index. Form-encoded in (query string on GET), JSON out.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::api::auth::{self, AuthUser, SharedSessions};
use crate::api::error::ApiError;
use crate::persistence::{self, SqlitePool};
use crate::quotes::QuoteProvider;
use crate::trade::{self, CostBasisMode};
use crate::types::money::{usd, Cents};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub quotes: Arc<dyn QuoteProvider>,
    pub sessions: SharedSessions,
    pub jwt_secret: Vec<u8>,
    pub starting_cash: Cents,
    pub cost_basis: CostBasisMode,
}

#[derive(Deserialize)]
struct RegisterForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirmation: String,
}

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
struct QuoteForm {
    symbol: Option<String>,
}

#[derive(Deserialize)]
struct TradeForm {
    symbol: Option<String>,
    shares: Option<String>,
}

async fn health() -> &'static str {
    "healthy"
}

async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<impl IntoResponse, ApiError> {
    if form.username.is_empty() {
        return Err(ApiError::validation("must provide username"));
    }
    if form.password.is_empty() {
        return Err(ApiError::validation("must provide password"));
    }
    if form.confirmation.is_empty() {
        return Err(ApiError::validation("must confirm password"));
    }
    if form.password != form.confirmation {
        return Err(ApiError::validation("passwords do not match"));
    }
    if persistence::get_user_by_username(&state.db, &form.username)
        .await?
        .is_some()
    {
        return Err(ApiError::domain("username already exists"));
    }

    let user_id = Uuid::new_v4();
    let password_hash = auth::hash_password(&form.password)?;
    persistence::insert_user(
        &state.db,
        user_id,
        &form.username,
        &password_hash,
        state.starting_cash,
    )
    .await?;
    info!(%user_id, username = %form.username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "user_id": user_id, "username": form.username })),
    ))
}

async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<Value>, ApiError> {
    if form.username.is_empty() {
        return Err(ApiError::auth("must provide username"));
    }
    if form.password.is_empty() {
        return Err(ApiError::auth("must provide password"));
    }

    let user = persistence::get_user_by_username(&state.db, &form.username)
        .await?
        .ok_or_else(|| ApiError::auth("invalid username and/or password"))?;
    if !auth::verify_password(&form.password, &user.password_hash) {
        return Err(ApiError::auth("invalid username and/or password"));
    }

    let session_id = Uuid::new_v4();
    state.sessions.write().await.insert(session_id);
    let token = auth::create_token(&state.jwt_secret, user.id, session_id)?;
    info!(user_id = %user.id, "user logged in");

    Ok(Json(json!({
        "token": token,
        "user_id": user.id,
        "username": user.username,
    })))
}

/// Logout is unconditional: revoke the presented session if there is one,
/// succeed either way.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    if let Some(token) = auth::bearer_token(&headers) {
        if let Ok(claims) = auth::decode_token(&state.jwt_secret, token) {
            if let Ok(session_id) = Uuid::parse_str(&claims.jti) {
                state.sessions.write().await.remove(&session_id);
            }
        }
    }
    Json(json!({ "message": "logged out" }))
}

/// Portfolio view: display name, cash, and current holdings. Falls back
/// to "Guest" if the user row is somehow gone.
async fn index(State(state): State<AppState>, user: AuthUser) -> Result<Json<Value>, ApiError> {
    let row = persistence::get_user_by_id(&state.db, user.user_id).await?;
    let name = row
        .as_ref()
        .map(|u| u.username.clone())
        .unwrap_or_else(|| "Guest".to_string());
    let cash = row.map(|u| u.cash).unwrap_or(0);
    let holdings = persistence::list_holdings_for_user(&state.db, user.user_id).await?;

    Ok(Json(json!({
        "name": name,
        "cash": cash,
        "cash_usd": usd(cash),
        "holdings": holdings
            .iter()
            .map(|h| json!({
                "symbol": h.stock_symbol,
                "shares": h.shares,
                "total_amount": h.total_amount,
                "total_amount_usd": usd(h.total_amount),
            }))
            .collect::<Vec<_>>(),
    })))
}

async fn quote(
    State(state): State<AppState>,
    _user: AuthUser,
    Form(form): Form<QuoteForm>,
) -> Result<Json<Value>, ApiError> {
    let symbol = form
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("must provide symbol"))?;
    let quote = state
        .quotes
        .lookup(&symbol.to_uppercase())
        .await?
        .ok_or_else(|| ApiError::domain("invalid symbol"))?;

    Ok(Json(json!({
        "symbol": quote.symbol,
        "name": quote.name,
        "price": quote.price,
        "price_usd": usd(quote.price),
    })))
}

async fn buy(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<TradeForm>,
) -> Result<Json<Value>, ApiError> {
    let receipt = trade::buy(
        &state.db,
        state.quotes.as_ref(),
        user.user_id,
        form.symbol.as_deref(),
        form.shares.as_deref(),
    )
    .await?;

    Ok(Json(json!({
        "symbol": receipt.symbol,
        "name": receipt.name,
        "shares": receipt.shares,
        "price": receipt.price,
        "price_usd": usd(receipt.price),
        "total_cost": receipt.total,
        "total_cost_usd": usd(receipt.total),
    })))
}

async fn sell(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<TradeForm>,
) -> Result<Json<Value>, ApiError> {
    let receipt = trade::sell(
        &state.db,
        state.quotes.as_ref(),
        state.cost_basis,
        user.user_id,
        form.symbol.as_deref(),
        form.shares.as_deref(),
    )
    .await?;
    let holdings = persistence::list_holdings_for_user(&state.db, user.user_id).await?;

    Ok(Json(json!({
        "symbol": receipt.symbol,
        "name": receipt.name,
        "shares": receipt.shares,
        "price": receipt.price,
        "price_usd": usd(receipt.price),
        "total_proceeds": receipt.total,
        "total_proceeds_usd": usd(receipt.total),
        "owned_symbols": holdings
            .iter()
            .map(|h| h.stock_symbol.clone())
            .collect::<Vec<_>>(),
    })))
}

async fn history(State(state): State<AppState>, user: AuthUser) -> Result<Json<Value>, ApiError> {
    let rows = persistence::list_history_for_user(&state.db, user.user_id).await?;
    Ok(Json(json!(rows)))
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/", get(index))
        .route("/quote", get(quote).post(quote))
        .route("/buy", get(buy).post(buy))
        .route("/sell", get(sell).post(sell))
        .route("/history", get(history))
        .with_state(state)
}
