//! Authentication error types.

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::cookie::{append_set_cookies, cleared_session_cookies};
use crate::db::StoreError;
use crate::jwt::TokenError;
use crate::redirect::{Notice, found};

/// Path every failed authentication is sent back to.
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username already exists")]
    DuplicateUsername,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("username and password are required")]
    MissingField,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed or its signature is invalid")]
    InvalidSignature,
    #[error("refresh token is unknown or was already used")]
    RefreshReuseOrUnknown,
    #[error("no session credentials presented")]
    NotAuthenticated,
    #[error("credential store unavailable")]
    StoreUnavailable,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateUsername => AuthError::DuplicateUsername,
            StoreError::Unavailable(e) => {
                tracing::warn!("Credential store unavailable: {}", e);
                AuthError::StoreUnavailable
            }
            StoreError::Database(e) => {
                tracing::error!("Credential store error: {}", e);
                AuthError::Internal("database error".to_string())
            }
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::Expired,
            TokenError::InvalidSignature => AuthError::InvalidSignature,
            other => {
                tracing::error!("Token error: {}", other);
                AuthError::Internal("token error".to_string())
            }
        }
    }
}

impl AuthError {
    /// The fixed, user-facing notice for a failed login or registration.
    pub fn notice(&self) -> Notice {
        match self {
            AuthError::InvalidCredentials => Notice::danger("Invalid username or password"),
            AuthError::DuplicateUsername => Notice::danger("Username is already taken"),
            AuthError::PasswordMismatch => Notice::warning("Passwords do not match"),
            AuthError::MissingField => Notice::warning("Username and password are required"),
            AuthError::StoreUnavailable => {
                Notice::warning("Service temporarily unavailable, please try again")
            }
            _ => Notice::danger("Something went wrong, please try again"),
        }
    }
}

/// Terminal outcome of the session middleware: both cookies are cleared and
/// the client is sent to the login page.
#[derive(Debug)]
pub struct SessionRejection {
    pub secure_cookies: bool,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        let mut response = found(LOGIN_PATH);
        append_set_cookies(
            response.headers_mut(),
            &cleared_session_cookies(self.secure_cookies),
        );
        response
    }
}
