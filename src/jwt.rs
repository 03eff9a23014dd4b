//! Signed access and refresh tokens.
//!
//! Each token kind has its own secret, so holding one kind of token (or its
//! secret) is never enough to forge the other. Tokens also carry a `typ`
//! claim that is checked on verification.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Access token lifetime: 1 hour.
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 60 * 60;

/// Refresh token lifetime: 30 days.
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims of a short-lived access token. Never stored server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    pub iat: u64,
    pub exp: u64,
}

/// Claims of a long-lived refresh token. Only a hash of the encoded token is
/// persisted; `jti` keeps two tokens minted in the same second distinct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub jti: String,
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    pub iat: u64,
    pub exp: u64,
}

trait TypedClaims {
    fn token_type(&self) -> TokenType;
}

impl TypedClaims for AccessClaims {
    fn token_type(&self) -> TokenType {
        self.token_type
    }
}

impl TypedClaims for RefreshClaims {
    fn token_type(&self) -> TokenType {
        self.token_type
    }
}

/// An encoded token together with its lifetime (used as cookie Max-Age).
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub duration: u64,
}

/// A freshly minted access/refresh pair for one user.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token is malformed or its signature is invalid")]
    InvalidSignature,
    #[error("failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    #[error("system time error")]
    TimeError,
}

/// Stateless creation and verification of access and refresh tokens.
#[derive(Clone)]
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

fn now_secs() -> Result<u64, TokenError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| TokenError::TimeError)?
        .as_secs())
}

impl TokenCodec {
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
        }
    }

    pub fn issue_access_token(&self, user_id: i64) -> Result<IssuedToken, TokenError> {
        self.issue_access_token_at(user_id, now_secs()?)
    }

    /// Issue an access token as if it had been minted at `issued_at`
    /// (Unix seconds).
    pub fn issue_access_token_at(
        &self,
        user_id: i64,
        issued_at: u64,
    ) -> Result<IssuedToken, TokenError> {
        let claims = AccessClaims {
            user_id,
            token_type: TokenType::Access,
            iat: issued_at,
            exp: issued_at + ACCESS_TOKEN_DURATION_SECS,
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(TokenError::Encoding)?;
        Ok(IssuedToken {
            token,
            duration: ACCESS_TOKEN_DURATION_SECS,
        })
    }

    pub fn issue_refresh_token(&self, user_id: i64) -> Result<IssuedToken, TokenError> {
        self.issue_refresh_token_at(user_id, now_secs()?)
    }

    /// Issue a refresh token as if it had been minted at `issued_at`
    /// (Unix seconds).
    pub fn issue_refresh_token_at(
        &self,
        user_id: i64,
        issued_at: u64,
    ) -> Result<IssuedToken, TokenError> {
        let claims = RefreshClaims {
            user_id,
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: TokenType::Refresh,
            iat: issued_at,
            exp: issued_at + REFRESH_TOKEN_DURATION_SECS,
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(TokenError::Encoding)?;
        Ok(IssuedToken {
            token,
            duration: REFRESH_TOKEN_DURATION_SECS,
        })
    }

    pub fn issue_pair(&self, user_id: i64) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue_access_token(user_id)?,
            refresh: self.issue_refresh_token(user_id)?,
        })
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        verify(token, &self.access_decoding, TokenType::Access)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        verify(token, &self.refresh_decoding, TokenType::Refresh)
    }
}

/// Verify signature, expiry and token kind. The signature is checked before
/// expiry, so a tampered expired token reports `InvalidSignature`.
fn verify<C>(token: &str, key: &DecodingKey, expected: TokenType) -> Result<C, TokenError>
where
    C: DeserializeOwned + TypedClaims,
{
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = jsonwebtoken::decode::<C>(token, key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::InvalidSignature,
    })?;

    if data.claims.token_type() != expected {
        return Err(TokenError::InvalidSignature);
    }

    Ok(data.claims)
}
