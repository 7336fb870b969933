//! Transaction history: append-only, read newest first.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::types::money::Cents;
use crate::types::transaction::TransactionType;

#[derive(Debug, FromRow, Serialize)]
pub struct HistoryRow {
    pub id: i64,
    pub user_id: Uuid,
    pub stock_symbol: String,
    pub shares: i64,
    pub price: Cents,
    pub transaction_type: String,
    pub timestamp: DateTime<Utc>,
}

/// Append one executed trade. Rows are never updated or deleted.
pub async fn insert_history(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    symbol: &str,
    shares: i64,
    price: Cents,
    transaction_type: TransactionType,
    timestamp: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO history (user_id, stock_symbol, shares, price, transaction_type, timestamp) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(user_id)
    .bind(symbol)
    .bind(shares)
    .bind(price)
    .bind(transaction_type.as_str())
    .bind(timestamp)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Full trade history for a user, newest first. The id tiebreak keeps
/// ordering stable for trades landing on the same timestamp.
pub async fn list_history_for_user(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<Vec<HistoryRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        "SELECT id, user_id, stock_symbol, shares, price, transaction_type, timestamp \
         FROM history WHERE user_id = $1 ORDER BY timestamp DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
