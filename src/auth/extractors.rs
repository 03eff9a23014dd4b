//! Axum extractors for authentication.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use super::errors::SessionRejection;
use super::session::{AuthenticatedUser, SessionAuthority};

/// The user injected by [`require_session`](super::require_session).
///
/// Only usable on routes behind the session middleware; anywhere else it
/// rejects like a failed session.
pub struct CurrentUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SessionAuthority: FromRef<S>,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthenticatedUser>() {
            Some(user) => Ok(CurrentUser(*user)),
            None => Err(SessionRejection {
                secure_cookies: SessionAuthority::from_ref(state).secure_cookies(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::jwt::TokenCodec;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
        response::IntoResponse,
    };
    use std::sync::Arc;

    async fn authority(secure_cookies: bool) -> SessionAuthority {
        let db = Database::open(":memory:").await.unwrap();
        let tokens = Arc::new(TokenCodec::new(
            b"test-access-secret-at-least-32-bytes!!",
            b"test-refresh-secret-at-least-32-bytes!",
        ));
        SessionAuthority::new(db, tokens, secure_cookies)
    }

    #[tokio::test]
    async fn test_injected_user_is_extracted() {
        let state = authority(true).await;
        let (mut parts, _) = Request::new(Body::empty()).into_parts();
        parts.extensions.insert(AuthenticatedUser { user_id: 7 });

        let Ok(CurrentUser(user)) = CurrentUser::from_request_parts(&mut parts, &state).await
        else {
            panic!("expected the injected user");
        };
        assert_eq!(user.user_id, 7);
    }

    #[tokio::test]
    async fn test_rejection_keeps_secure_flag() {
        let state = authority(true).await;
        let (mut parts, _) = Request::new(Body::empty()).into_parts();

        let Err(rejection) = CurrentUser::from_request_parts(&mut parts, &state).await else {
            panic!("expected a rejection without an injected user");
        };
        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::FOUND);

        let cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.ends_with("; Secure")));
    }
}
