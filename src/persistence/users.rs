//! User persistence: lookup, insert, and cash adjustments.

use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::types::money::Cents;

/// Row from the `users` table. Cash is in cents.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub cash: Cents,
}

/// Get a user by username. Usernames are case-sensitive.
pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, password_hash, cash FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<UserRow>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, password_hash, cash FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Insert a user with their starting cash balance.
pub async fn insert_user(
    pool: &SqlitePool,
    id: Uuid,
    username: &str,
    password_hash: &str,
    cash: Cents,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO users (id, username, password_hash, cash) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(username)
        .bind(password_hash)
        .bind(cash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Current cash balance, read inside a trade transaction.
pub async fn get_cash(conn: &mut SqliteConnection, user_id: Uuid) -> Result<Cents, sqlx::Error> {
    sqlx::query_scalar::<_, Cents>("SELECT cash FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
}

/// Apply a signed cash delta: negative debits a buy, positive credits a sell.
pub async fn adjust_cash(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    delta: Cents,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET cash = cash + $1 WHERE id = $2")
        .bind(delta)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
