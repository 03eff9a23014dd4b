//! Session middleware wrapping every protected route.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::cookie::{append_set_cookies, session_cookies};
use super::errors::{AuthError, SessionRejection};
use super::session::{Authenticated, SessionAuthority};

/// Authenticate the request, inject the [`AuthenticatedUser`] into its
/// extensions and, after a renewal, append the new cookie pair to the
/// response. Any failure clears both cookies and redirects to the login page.
///
/// [`AuthenticatedUser`]: super::AuthenticatedUser
pub async fn require_session(
    State(authority): State<SessionAuthority>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = match authority.authenticate(request.headers()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            match &e {
                AuthError::RefreshReuseOrUnknown | AuthError::StoreUnavailable => {
                    tracing::warn!("Session rejected: {}", e)
                }
                _ => tracing::debug!("Session rejected: {}", e),
            }
            return SessionRejection {
                secure_cookies: authority.secure_cookies(),
            }
            .into_response();
        }
    };

    request.extensions_mut().insert(outcome.user());
    let mut response = next.run(request).await;

    if let Authenticated::Renewed(_, pair) = &outcome {
        append_set_cookies(
            response.headers_mut(),
            &session_cookies(pair, authority.secure_cookies()),
        );
    }
    response
}
