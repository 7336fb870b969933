//! Quote lookup: external price source behind the `QuoteProvider` trait.
//! The HTTP implementation is used in production; the static one in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::types::money::{dollars_to_cents, Cents};

/// A point-in-time price for a symbol. Price is in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Cents,
}

#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("quote request failed")]
    Http(#[from] reqwest::Error),
    #[error("malformed quote response")]
    Malformed,
}

/// Price source. `Ok(None)` means the symbol is unknown; callers must
/// treat that as a validation failure and mutate nothing.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, QuoteError>;
}

/// Remote quote service speaking JSON over HTTP:
/// `GET {base_url}/quote?symbol=NVDA` -> `{"symbol", "name", "price"}`
/// with the price in dollars. 404 means unknown symbol.
pub struct HttpQuoteProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct QuotePayload {
    symbol: String,
    name: String,
    price: f64,
}

impl HttpQuoteProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl QuoteProvider for HttpQuoteProvider {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, QuoteError> {
        let response = self
            .client
            .get(format!("{}/quote", self.base_url))
            .query(&[("symbol", symbol)])
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let payload: QuotePayload = response.error_for_status()?.json().await?;
        if !payload.price.is_finite() || payload.price <= 0.0 {
            return Err(QuoteError::Malformed);
        }
        Ok(Some(Quote {
            symbol: payload.symbol.to_uppercase(),
            name: payload.name,
            price: dollars_to_cents(payload.price),
        }))
    }
}

/// In-memory price table. Tests repoint prices between trades with
/// `set_price`.
#[derive(Default)]
pub struct StaticQuoteProvider {
    quotes: RwLock<HashMap<String, Quote>>,
}

impl StaticQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_price(&self, symbol: &str, name: &str, price: Cents) {
        let symbol = symbol.to_uppercase();
        self.quotes.write().await.insert(
            symbol.clone(),
            Quote {
                symbol,
                name: name.to_string(),
                price,
            },
        );
    }
}

#[async_trait]
impl QuoteProvider for StaticQuoteProvider {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, QuoteError> {
        Ok(self.quotes.read().await.get(&symbol.to_uppercase()).cloned())
    }
}
