//! Session cookie parsing and `Set-Cookie` values.

use axum::http::{HeaderMap, HeaderValue, header};

use crate::jwt::{IssuedToken, TokenPair};

/// Cookie carrying the access token (short-lived, 1 hour).
pub const ACCESS_COOKIE_NAME: &str = "accessToken";

/// Cookie carrying the refresh token (long-lived, 30 days).
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Extract a cookie value from the Cookie header. An empty value counts as
/// absent.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                let value = value.trim();
                return (!value.is_empty()).then_some(value);
            }
        }
    }
    None
}

fn secure_attr(secure: bool) -> &'static str {
    if secure { "; Secure" } else { "" }
}

/// `Set-Cookie` value installing `token` under `name`.
pub fn token_cookie(name: &str, token: &IssuedToken, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        name,
        token.token,
        token.duration,
        secure_attr(secure)
    )
}

/// `Set-Cookie` value deleting the cookie `name`.
pub fn cleared_cookie(name: &str, secure: bool) -> String {
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{}",
        name,
        secure_attr(secure)
    )
}

/// Both session cookies for a freshly issued pair.
pub fn session_cookies(pair: &TokenPair, secure: bool) -> [String; 2] {
    [
        token_cookie(ACCESS_COOKIE_NAME, &pair.access, secure),
        token_cookie(REFRESH_COOKIE_NAME, &pair.refresh, secure),
    ]
}

/// Deletion cookies for both session cookies.
pub fn cleared_session_cookies(secure: bool) -> [String; 2] {
    [
        cleared_cookie(ACCESS_COOKIE_NAME, secure),
        cleared_cookie(REFRESH_COOKIE_NAME, secure),
    ]
}

/// Append each cookie as its own `Set-Cookie` header.
pub fn append_set_cookies(headers: &mut HeaderMap, cookies: &[String]) {
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(cookie) {
            headers.append(header::SET_COOKIE, value);
        }
    }
}
