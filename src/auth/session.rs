//! The session authority: registration, login, logout and the per-request
//! authenticate-and-renew algorithm.
//!
//! Access tokens are stateless. Refresh tokens are single use: every renewal
//! redeems the presented token and mints a successor in the same store
//! transaction, so a replayed or raced refresh token is always rejected.

use std::sync::Arc;

use axum::http::HeaderMap;

use super::cookie::{ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, get_cookie};
use super::errors::AuthError;
use crate::db::{Database, hash_token};
use crate::jwt::{TokenCodec, TokenError, TokenPair};
use crate::password::{hash_password, verify_password_or_dummy};

/// The user a request was authenticated as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

/// Where a request stands after its access cookie has been examined.
/// Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No access token was presented.
    Unauthenticated,
    AccessTokenValid(AuthenticatedUser),
    AccessTokenExpiredRefreshPending,
    /// Terminal: the presented credentials cannot establish a session. A
    /// malformed or wrongly signed access token lands here directly; the
    /// refresh token is not consulted, so a forged access cookie cannot spend
    /// it.
    RefreshInvalid,
}

/// Successful outcome of [`SessionAuthority::authenticate`].
#[derive(Debug)]
pub enum Authenticated {
    /// The access token was still valid; no cookies change.
    Valid(AuthenticatedUser),
    /// The refresh token was redeemed; the new pair must be set as cookies.
    Renewed(AuthenticatedUser, TokenPair),
}

impl Authenticated {
    pub fn user(&self) -> AuthenticatedUser {
        match self {
            Authenticated::Valid(user) | Authenticated::Renewed(user, _) => *user,
        }
    }
}

#[derive(Clone)]
pub struct SessionAuthority {
    db: Database,
    tokens: Arc<TokenCodec>,
    secure_cookies: bool,
}

impl SessionAuthority {
    pub fn new(db: Database, tokens: Arc<TokenCodec>, secure_cookies: bool) -> Self {
        Self {
            db,
            tokens,
            secure_cookies,
        }
    }

    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    /// Create an account. The password is only ever stored as a slow salted
    /// hash.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<i64, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingField);
        }
        if password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let user_id = self.db.users().create(username, &password_hash).await?;
        tracing::info!(user_id, "Registered new user");
        Ok(user_id)
    }

    /// Check credentials and open a new session. Earlier sessions of the same
    /// user stay valid.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingField);
        }

        let user = self.db.users().get_by_username(username).await?;

        // Unknown usernames are verified against a dummy hash so both failure
        // paths take the same time.
        let password = password.to_string();
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let matches = tokio::task::spawn_blocking(move || {
            verify_password_or_dummy(&password, stored_hash.as_deref())
        })
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;

        let Some(user) = user else {
            tracing::debug!("Login for unknown username");
            return Err(AuthError::InvalidCredentials);
        };
        if !matches {
            tracing::debug!(user_id = user.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.tokens.issue_pair(user.id)?;
        self.db
            .refresh_tokens()
            .create(user.id, &hash_token(&pair.refresh.token))
            .await?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(pair)
    }

    /// Revoke the presented refresh token, if it verifies. Never fails: the
    /// caller clears the cookies either way.
    pub async fn logout(&self, headers: &HeaderMap) {
        let Some(raw) = get_cookie(headers, REFRESH_COOKIE_NAME) else {
            return;
        };
        let Ok(claims) = self.tokens.verify_refresh_token(raw) else {
            return;
        };
        match self.db.refresh_tokens().mark_used(&hash_token(raw)).await {
            Ok(true) => tracing::info!(user_id = claims.user_id, "Refresh token revoked on logout"),
            Ok(false) => {}
            Err(e) => tracing::warn!(user_id = claims.user_id, "Failed to revoke refresh token: {}", e),
        }
    }

    /// Classify the access cookie of a request.
    pub fn session_state(&self, headers: &HeaderMap) -> SessionState {
        let Some(raw) = get_cookie(headers, ACCESS_COOKIE_NAME) else {
            return SessionState::Unauthenticated;
        };
        match self.tokens.verify_access_token(raw) {
            Ok(claims) => SessionState::AccessTokenValid(AuthenticatedUser {
                user_id: claims.user_id,
            }),
            Err(TokenError::Expired) => SessionState::AccessTokenExpiredRefreshPending,
            Err(_) => SessionState::RefreshInvalid,
        }
    }

    /// Authenticate a request from its cookies, renewing the session through
    /// the refresh token when the access token is missing or expired.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Authenticated, AuthError> {
        match self.session_state(headers) {
            SessionState::AccessTokenValid(user) => Ok(Authenticated::Valid(user)),
            SessionState::RefreshInvalid => Err(AuthError::InvalidSignature),
            SessionState::Unauthenticated | SessionState::AccessTokenExpiredRefreshPending => {
                let raw = get_cookie(headers, REFRESH_COOKIE_NAME)
                    .ok_or(AuthError::NotAuthenticated)?;
                self.renew(raw).await
            }
        }
    }

    /// Redeem a raw refresh token for a new pair.
    pub async fn renew(&self, raw_refresh: &str) -> Result<Authenticated, AuthError> {
        let claims = self.tokens.verify_refresh_token(raw_refresh)?;
        let pair = self.tokens.issue_pair(claims.user_id)?;

        let rotated = self
            .db
            .refresh_tokens()
            .rotate(
                &hash_token(raw_refresh),
                claims.user_id,
                &hash_token(&pair.refresh.token),
            )
            .await?;
        if !rotated {
            tracing::warn!(
                user_id = claims.user_id,
                "Rejected refresh token that is unknown or already used"
            );
            return Err(AuthError::RefreshReuseOrUnknown);
        }

        tracing::debug!(user_id = claims.user_id, "Session renewed");
        Ok(Authenticated::Renewed(
            AuthenticatedUser {
                user_id: claims.user_id,
            },
            pair,
        ))
    }
}
