//! Trade engine tests against the library directly, no HTTP: invariants
//! of buy/sell, cost-basis modes, and failure atomicity.

mod common;

use common::test_pool;
use sqlx::SqlitePool;
use stocksim::api::auth::hash_password;
use stocksim::persistence;
use stocksim::quotes::StaticQuoteProvider;
use stocksim::trade::{self, CostBasisMode, TradeError};
use uuid::Uuid;

async fn seed_user(pool: &SqlitePool, cash: i64) -> Uuid {
    let user_id = Uuid::new_v4();
    let hash = hash_password("pw").unwrap();
    persistence::insert_user(pool, user_id, &format!("user-{user_id}"), &hash, cash)
        .await
        .unwrap();
    user_id
}

async fn holding_of(
    pool: &SqlitePool,
    user_id: Uuid,
    symbol: &str,
) -> Option<persistence::HoldingRow> {
    let mut conn = pool.acquire().await.unwrap();
    persistence::get_holding(&mut conn, user_id, symbol)
        .await
        .unwrap()
}

async fn cash_of(pool: &SqlitePool, user_id: Uuid) -> i64 {
    persistence::get_user_by_id(pool, user_id)
        .await
        .unwrap()
        .unwrap()
        .cash
}

#[tokio::test]
async fn buy_writes_holding_history_and_cash_together() {
    let pool = test_pool().await;
    let quotes = StaticQuoteProvider::new();
    quotes.set_price("NVDA", "NVIDIA Corp", 10000).await;
    let user_id = seed_user(&pool, 1_000_000).await;

    let receipt = trade::buy(&pool, &quotes, user_id, Some("nvda"), Some("10"))
        .await
        .unwrap();
    assert_eq!(receipt.symbol, "NVDA");
    assert_eq!(receipt.shares, 10);
    assert_eq!(receipt.price, 10000);
    assert_eq!(receipt.total, 100000);

    let holding = holding_of(&pool, user_id, "NVDA").await.unwrap();
    assert_eq!(holding.shares, 10);
    assert_eq!(holding.total_amount, 100000);
    assert_eq!(cash_of(&pool, user_id).await, 900_000);

    let history = persistence::list_history_for_user(&pool, user_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].transaction_type, "BUY");
    assert_eq!(history[0].stock_symbol, "NVDA");
    assert_eq!(history[0].shares, 10);
    assert_eq!(history[0].price, 10000);
}

#[tokio::test]
async fn second_buy_increments_existing_holding() {
    let pool = test_pool().await;
    let quotes = StaticQuoteProvider::new();
    quotes.set_price("NVDA", "NVIDIA Corp", 10000).await;
    let user_id = seed_user(&pool, 1_000_000).await;

    trade::buy(&pool, &quotes, user_id, Some("NVDA"), Some("10"))
        .await
        .unwrap();
    quotes.set_price("NVDA", "NVIDIA Corp", 12000).await;
    trade::buy(&pool, &quotes, user_id, Some("NVDA"), Some("5"))
        .await
        .unwrap();

    let holding = holding_of(&pool, user_id, "NVDA").await.unwrap();
    assert_eq!(holding.shares, 15);
    assert_eq!(holding.total_amount, 100000 + 60000);
}

#[tokio::test]
async fn buy_with_insufficient_funds_changes_nothing() {
    let pool = test_pool().await;
    let quotes = StaticQuoteProvider::new();
    quotes.set_price("NVDA", "NVIDIA Corp", 10000).await;
    let user_id = seed_user(&pool, 50000).await;

    let err = trade::buy(&pool, &quotes, user_id, Some("NVDA"), Some("6"))
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::InsufficientFunds));

    assert_eq!(cash_of(&pool, user_id).await, 50000);
    assert!(holding_of(&pool, user_id, "NVDA").await.is_none());
    assert!(persistence::list_history_for_user(&pool, user_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn buy_validation_failures_map_to_expected_errors() {
    let pool = test_pool().await;
    let quotes = StaticQuoteProvider::new();
    quotes.set_price("NVDA", "NVIDIA Corp", 10000).await;
    let user_id = seed_user(&pool, 1_000_000).await;

    assert!(matches!(
        trade::buy(&pool, &quotes, user_id, None, Some("5")).await,
        Err(TradeError::MissingSymbol)
    ));
    assert!(matches!(
        trade::buy(&pool, &quotes, user_id, Some("NVDA"), Some("zero")).await,
        Err(TradeError::InvalidShareCount)
    ));
    assert!(matches!(
        trade::buy(&pool, &quotes, user_id, Some("NVDA"), None).await,
        Err(TradeError::InvalidShareCount)
    ));
    assert!(matches!(
        trade::buy(&pool, &quotes, user_id, Some("ZZZZ"), Some("5")).await,
        Err(TradeError::InvalidSymbol)
    ));
}

#[tokio::test]
async fn sell_in_proceeds_mode_subtracts_sale_proceeds_from_basis() {
    let pool = test_pool().await;
    let quotes = StaticQuoteProvider::new();
    quotes.set_price("NVDA", "NVIDIA Corp", 10000).await;
    let user_id = seed_user(&pool, 1_000_000).await;

    trade::buy(&pool, &quotes, user_id, Some("NVDA"), Some("10"))
        .await
        .unwrap();
    quotes.set_price("NVDA", "NVIDIA Corp", 15000).await;
    let receipt = trade::sell(
        &pool,
        &quotes,
        CostBasisMode::Proceeds,
        user_id,
        Some("NVDA"),
        Some("4"),
    )
    .await
    .unwrap();
    assert_eq!(receipt.total, 60000);

    let holding = holding_of(&pool, user_id, "NVDA").await.unwrap();
    assert_eq!(holding.shares, 6);
    assert_eq!(holding.total_amount, 100000 - 60000);
    assert_eq!(cash_of(&pool, user_id).await, 900_000 + 60000);
}

#[tokio::test]
async fn sell_in_proportional_mode_subtracts_sold_fraction_of_basis() {
    let pool = test_pool().await;
    let quotes = StaticQuoteProvider::new();
    quotes.set_price("NVDA", "NVIDIA Corp", 10000).await;
    let user_id = seed_user(&pool, 1_000_000).await;

    trade::buy(&pool, &quotes, user_id, Some("NVDA"), Some("10"))
        .await
        .unwrap();
    quotes.set_price("NVDA", "NVIDIA Corp", 15000).await;
    trade::sell(
        &pool,
        &quotes,
        CostBasisMode::Proportional,
        user_id,
        Some("NVDA"),
        Some("4"),
    )
    .await
    .unwrap();

    let holding = holding_of(&pool, user_id, "NVDA").await.unwrap();
    assert_eq!(holding.shares, 6);
    // 4/10 of the 100000 basis leaves with the sold shares.
    assert_eq!(holding.total_amount, 60000);
}

#[tokio::test]
async fn selling_everything_deletes_the_holding_row() {
    let pool = test_pool().await;
    let quotes = StaticQuoteProvider::new();
    quotes.set_price("NVDA", "NVIDIA Corp", 10000).await;
    let user_id = seed_user(&pool, 1_000_000).await;

    trade::buy(&pool, &quotes, user_id, Some("NVDA"), Some("10"))
        .await
        .unwrap();
    trade::sell(
        &pool,
        &quotes,
        CostBasisMode::Proceeds,
        user_id,
        Some("NVDA"),
        Some("10"),
    )
    .await
    .unwrap();

    assert!(holding_of(&pool, user_id, "NVDA").await.is_none());
    assert_eq!(cash_of(&pool, user_id).await, 1_000_000);
}

#[tokio::test]
async fn oversell_fails_without_touching_the_store() {
    let pool = test_pool().await;
    let quotes = StaticQuoteProvider::new();
    quotes.set_price("NVDA", "NVIDIA Corp", 10000).await;
    let user_id = seed_user(&pool, 1_000_000).await;

    trade::buy(&pool, &quotes, user_id, Some("NVDA"), Some("3"))
        .await
        .unwrap();
    let err = trade::sell(
        &pool,
        &quotes,
        CostBasisMode::Proceeds,
        user_id,
        Some("NVDA"),
        Some("4"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, TradeError::InsufficientShares));

    let holding = holding_of(&pool, user_id, "NVDA").await.unwrap();
    assert_eq!(holding.shares, 3);
    assert_eq!(cash_of(&pool, user_id).await, 970_000);
    let history = persistence::list_history_for_user(&pool, user_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn sell_without_any_holding_is_insufficient_shares() {
    let pool = test_pool().await;
    let quotes = StaticQuoteProvider::new();
    quotes.set_price("NVDA", "NVIDIA Corp", 10000).await;
    let user_id = seed_user(&pool, 1_000_000).await;

    let err = trade::sell(
        &pool,
        &quotes,
        CostBasisMode::Proceeds,
        user_id,
        Some("NVDA"),
        Some("1"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, TradeError::InsufficientShares));
}

#[tokio::test]
async fn history_net_shares_match_current_holding() {
    let pool = test_pool().await;
    let quotes = StaticQuoteProvider::new();
    quotes.set_price("NVDA", "NVIDIA Corp", 10000).await;
    let user_id = seed_user(&pool, 1_000_000).await;

    trade::buy(&pool, &quotes, user_id, Some("NVDA"), Some("10"))
        .await
        .unwrap();
    trade::sell(
        &pool,
        &quotes,
        CostBasisMode::Proceeds,
        user_id,
        Some("NVDA"),
        Some("4"),
    )
    .await
    .unwrap();
    trade::buy(&pool, &quotes, user_id, Some("NVDA"), Some("2"))
        .await
        .unwrap();

    let history = persistence::list_history_for_user(&pool, user_id)
        .await
        .unwrap();
    let net: i64 = history
        .iter()
        .map(|h| match h.transaction_type.as_str() {
            "BUY" => h.shares,
            _ => -h.shares,
        })
        .sum();
    let holding = holding_of(&pool, user_id, "NVDA").await.unwrap();
    assert_eq!(net, holding.shares);
}
