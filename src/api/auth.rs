//! Auth gate: argon2 password hashing, session tokens, and the
//! `AuthUser` extractor every protected route goes through first.

use std::collections::HashSet;
use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::routes::AppState;

/// Token claims: `sub` = user id, `jti` = session id (revoked on logout),
/// `exp` (expiry), `iat` (issued at).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
}

/// Live session ids. A token is only honored while its `jti` is in here;
/// logout removes it, revoking the token server-side.
pub type SharedSessions = Arc<RwLock<HashSet<Uuid>>>;

/// Authenticated user extracted from a Bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

const TOKEN_EXPIRY_HOURS: i64 = 24;

impl Claims {
    pub fn new(user_id: Uuid, session_id: Uuid) -> Self {
        let now = chrono::Utc::now();
        let exp = (now + chrono::Duration::hours(TOKEN_EXPIRY_HOURS)).timestamp();
        Self {
            sub: user_id.to_string(),
            jti: session_id.to_string(),
            exp,
            iat: now.timestamp(),
        }
    }
}

pub fn create_token(
    secret: &[u8],
    user_id: Uuid,
    session_id: Uuid,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::new(user_id, session_id);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

pub fn decode_token(secret: &[u8], token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)?;
    Ok(token_data.claims)
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2 hash. Comparison inside the
/// verifier is constant-time.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Pull the token out of an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn unauthenticated() -> ApiError {
    ApiError::auth("must log in")
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(unauthenticated)?;
        let claims = decode_token(&state.jwt_secret, token).map_err(|_| unauthenticated())?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| unauthenticated())?;
        let session_id = Uuid::parse_str(&claims.jti).map_err(|_| unauthenticated())?;
        if !state.sessions.read().await.contains(&session_id) {
            return Err(unauthenticated());
        }
        Ok(AuthUser { user_id })
    }
}
