//! Trade engine: validates buy/sell requests, resolves a quote, and
//! applies the mutation (cash + holding + history) in one transaction.
//! Any failure before commit leaves the store untouched.

use std::str::FromStr;

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::persistence;
use crate::quotes::{QuoteError, QuoteProvider};
use crate::types::money::Cents;
use crate::types::transaction::TransactionType;

#[derive(Debug, thiserror::Error)]
pub enum TradeError {
    #[error("Missing stock symbol")]
    MissingSymbol,
    #[error("Invalid number of shares")]
    InvalidShareCount,
    #[error("Invalid stock symbol")]
    InvalidSymbol,
    #[error("Not enough shares to sell")]
    InsufficientShares,
    #[error("Not enough cash to complete purchase")]
    InsufficientFunds,
    #[error("quote lookup failed")]
    Quote(#[from] QuoteError),
    #[error("database error")]
    Db(#[from] sqlx::Error),
}

/// How a partial sell reduces the holding's recorded cost basis.
///
/// `Proceeds` subtracts the sale proceeds from the basis, reproducing the
/// system this replaces. `Proportional` subtracts the sold fraction of the
/// original basis, which is the accounting-correct variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostBasisMode {
    #[default]
    Proceeds,
    Proportional,
}

impl FromStr for CostBasisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proceeds" => Ok(CostBasisMode::Proceeds),
            "proportional" => Ok(CostBasisMode::Proportional),
            other => Err(format!("unknown cost basis mode '{other}'")),
        }
    }
}

/// Outcome of an executed trade. `total` is cost for a buy, proceeds for
/// a sell; all amounts in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeReceipt {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    pub price: Cents,
    pub total: Cents,
}

/// Share counts come in as raw form input: accept only a non-empty
/// all-digit string with a positive value.
pub fn parse_share_count(input: &str) -> Option<i64> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let shares = input.parse::<i64>().ok()?;
    (shares > 0).then_some(shares)
}

fn normalize_symbol(symbol: Option<&str>) -> Result<String, TradeError> {
    match symbol.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_uppercase()),
        _ => Err(TradeError::MissingSymbol),
    }
}

fn parse_shares(shares: Option<&str>) -> Result<i64, TradeError> {
    shares
        .map(str::trim)
        .and_then(parse_share_count)
        .ok_or(TradeError::InvalidShareCount)
}

/// Buy shares at the current quoted price. Debits cash, upserts the
/// holding, and appends a BUY history entry atomically.
pub async fn buy(
    db: &SqlitePool,
    quotes: &dyn QuoteProvider,
    user_id: Uuid,
    symbol: Option<&str>,
    shares: Option<&str>,
) -> Result<TradeReceipt, TradeError> {
    let symbol = normalize_symbol(symbol)?;
    let shares = parse_shares(shares)?;
    let quote = quotes
        .lookup(&symbol)
        .await?
        .ok_or(TradeError::InvalidSymbol)?;
    let total_cost = quote
        .price
        .checked_mul(shares)
        .ok_or(TradeError::InvalidShareCount)?;

    let mut tx = db.begin().await?;
    let cash = persistence::get_cash(&mut tx, user_id).await?;
    if cash < total_cost {
        return Err(TradeError::InsufficientFunds);
    }
    persistence::adjust_cash(&mut tx, user_id, -total_cost).await?;
    persistence::add_to_holding(&mut tx, user_id, &symbol, shares, total_cost).await?;
    persistence::insert_history(
        &mut tx,
        user_id,
        &symbol,
        shares,
        quote.price,
        TransactionType::Buy,
        Utc::now(),
    )
    .await?;
    tx.commit().await?;

    info!(%user_id, %symbol, shares, price = quote.price, "buy executed");
    Ok(TradeReceipt {
        symbol,
        name: quote.name,
        shares,
        price: quote.price,
        total: total_cost,
    })
}

/// Sell shares from an existing holding. Credits cash, shrinks or removes
/// the holding, and appends a SELL history entry atomically.
pub async fn sell(
    db: &SqlitePool,
    quotes: &dyn QuoteProvider,
    cost_basis: CostBasisMode,
    user_id: Uuid,
    symbol: Option<&str>,
    shares: Option<&str>,
) -> Result<TradeReceipt, TradeError> {
    let symbol = normalize_symbol(symbol)?;
    let shares = parse_shares(shares)?;
    let quote = quotes
        .lookup(&symbol)
        .await?
        .ok_or(TradeError::InvalidSymbol)?;
    let proceeds = quote
        .price
        .checked_mul(shares)
        .ok_or(TradeError::InvalidShareCount)?;

    let mut tx = db.begin().await?;
    let holding = persistence::get_holding(&mut tx, user_id, &symbol)
        .await?
        .ok_or(TradeError::InsufficientShares)?;
    if holding.shares < shares {
        return Err(TradeError::InsufficientShares);
    }

    persistence::adjust_cash(&mut tx, user_id, proceeds).await?;
    let remaining = holding.shares - shares;
    if remaining == 0 {
        persistence::delete_holding(&mut tx, user_id, &symbol).await?;
    } else {
        let basis_reduction = match cost_basis {
            CostBasisMode::Proceeds => proceeds,
            CostBasisMode::Proportional => holding.total_amount * shares / holding.shares,
        };
        persistence::reduce_holding(&mut tx, user_id, &symbol, remaining, basis_reduction).await?;
    }
    persistence::insert_history(
        &mut tx,
        user_id,
        &symbol,
        shares,
        quote.price,
        TransactionType::Sell,
        Utc::now(),
    )
    .await?;
    tx.commit().await?;

    info!(%user_id, %symbol, shares, price = quote.price, "sell executed");
    Ok(TradeReceipt {
        symbol,
        name: quote.name,
        shares,
        price: quote.price,
        total: proceeds,
    })
}
