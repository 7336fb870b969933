//! Runtime configuration from environment variables (and `.env` in dev).

use std::env;

use anyhow::Context;

use crate::trade::CostBasisMode;
use crate::types::money::Cents;

/// New accounts start with $10,000.00 of virtual cash.
pub const DEFAULT_STARTING_CASH: Cents = 1_000_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub quote_api_url: String,
    pub starting_cash: Cents,
    pub cost_basis: CostBasisMode,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let starting_cash = match env::var("STARTING_CASH_CENTS") {
            Ok(value) => value
                .parse::<Cents>()
                .context("STARTING_CASH_CENTS must be an integer cent amount")?,
            Err(_) => DEFAULT_STARTING_CASH,
        };
        let cost_basis = match env::var("COST_BASIS") {
            Ok(value) => value.parse::<CostBasisMode>().map_err(anyhow::Error::msg)?,
            Err(_) => CostBasisMode::default(),
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://finance.db".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            quote_api_url: env::var("QUOTE_API_URL").context("QUOTE_API_URL must be set")?,
            starting_cash,
            cost_basis,
        })
    }
}
