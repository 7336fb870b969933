//! Holding persistence: one row per (user, symbol), shares always > 0.

use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::types::money::Cents;

#[derive(Debug, FromRow)]
pub struct HoldingRow {
    pub user_id: Uuid,
    pub stock_symbol: String,
    pub shares: i64,
    pub total_amount: Cents,
}

/// Load one holding inside a trade transaction.
pub async fn get_holding(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    symbol: &str,
) -> Result<Option<HoldingRow>, sqlx::Error> {
    let row = sqlx::query_as::<_, HoldingRow>(
        "SELECT user_id, stock_symbol, shares, total_amount FROM holdings \
         WHERE user_id = $1 AND stock_symbol = $2",
    )
    .bind(user_id)
    .bind(symbol)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

/// List a user's holdings (for the portfolio view and sell form).
pub async fn list_holdings_for_user(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<Vec<HoldingRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, HoldingRow>(
        "SELECT user_id, stock_symbol, shares, total_amount FROM holdings \
         WHERE user_id = $1 ORDER BY stock_symbol",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Add shares to a holding, creating the row on first buy of a symbol.
pub async fn add_to_holding(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    symbol: &str,
    shares: i64,
    amount: Cents,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO holdings (user_id, stock_symbol, shares, total_amount) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id, stock_symbol) DO UPDATE SET \
         shares = shares + excluded.shares, \
         total_amount = total_amount + excluded.total_amount",
    )
    .bind(user_id)
    .bind(symbol)
    .bind(shares)
    .bind(amount)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Partial sell: set the remaining share count and reduce the cost basis.
pub async fn reduce_holding(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    symbol: &str,
    remaining_shares: i64,
    basis_reduction: Cents,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE holdings SET shares = $1, total_amount = total_amount - $2 \
         WHERE user_id = $3 AND stock_symbol = $4",
    )
    .bind(remaining_shares)
    .bind(basis_reduction)
    .bind(user_id)
    .bind(symbol)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Remove the row once a position is fully sold.
pub async fn delete_holding(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    symbol: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM holdings WHERE user_id = $1 AND stock_symbol = $2")
        .bind(user_id)
        .bind(symbol)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
