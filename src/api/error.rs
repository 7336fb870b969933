//! API error taxonomy. Validation and domain failures map to 400, auth
//! failures to 403, everything unexpected to 500 with a generic body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::quotes::QuoteError;
use crate::trade::TradeError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Domain(String),
    #[error("internal server error")]
    Database(#[from] sqlx::Error),
    #[error("internal server error")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("internal server error")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("internal server error")]
    Quote(#[from] QuoteError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        ApiError::Auth(message.into())
    }

    pub fn domain(message: impl Into<String>) -> Self {
        ApiError::Domain(message.into())
    }
}

impl From<TradeError> for ApiError {
    fn from(err: TradeError) -> Self {
        match err {
            TradeError::MissingSymbol | TradeError::InvalidShareCount => {
                ApiError::Validation(err.to_string())
            }
            TradeError::InvalidSymbol
            | TradeError::InsufficientShares
            | TradeError::InsufficientFunds => ApiError::Domain(err.to_string()),
            TradeError::Quote(e) => ApiError::Quote(e),
            TradeError::Db(e) => ApiError::Database(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) | ApiError::Domain(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
