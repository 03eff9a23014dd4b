//! Route layer.
//!
//! Protected routes sit behind [`require_session`]; credential endpoints are
//! rate limited per client.

mod comments;
mod error;
mod lists;
mod movies;
mod session;

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::auth::{SessionAuthority, require_session};
use crate::catalog::CachePopulator;
use crate::db::{Database, StoreError};
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_register};
use crate::redirect::{Border, Notice};

pub use error::{ApiError, ResultExt};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionAuthority,
    pub catalog: Arc<CachePopulator>,
}

impl FromRef<AppState> for SessionAuthority {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

/// `message`/`border` query parameters left by a redirect.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct NoticeQuery {
    message: Option<String>,
    border: Option<String>,
}

/// Notice echoed back to the client. Unknown border classes are dropped.
#[derive(Debug, Serialize)]
pub(crate) struct NoticeView {
    message: Option<String>,
    border: Option<Border>,
}

impl From<NoticeQuery> for NoticeView {
    fn from(query: NoticeQuery) -> Self {
        let border = query.border.as_deref().and_then(|class| {
            [Border::Success, Border::Warning, Border::Danger]
                .into_iter()
                .find(|b| b.as_class() == class)
        });
        Self {
            message: query.message,
            border,
        }
    }
}

/// Log a store failure behind a form post and pick the notice shown instead.
pub(crate) fn store_failure_notice(context: &str, e: StoreError) -> Notice {
    match e {
        StoreError::Unavailable(_) => {
            tracing::warn!("{}: {}", context, e);
            Notice::warning("Service temporarily unavailable, please try again")
        }
        _ => {
            tracing::error!("{}: {}", context, e);
            Notice::danger("Something went wrong, please try again")
        }
    }
}

/// Create the application router.
pub fn create_router(state: AppState, rate_limits: RateLimitConfig) -> Router {
    let protected = Router::new()
        .route("/", get(session::home))
        .route("/searchResults", get(movies::search_results))
        .route("/watchlist", get(lists::watchlist))
        .route("/favorites", get(lists::favorites))
        .route("/addTowatchlist", post(lists::add_to_watchlist))
        .route("/addToFavorites", post(lists::add_to_favorites))
        .route("/movie/edit", get(movies::edit_form).post(movies::edit))
        .route(
            "/addComment",
            get(comments::comment_form).post(comments::add_comment),
        )
        .route_layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            require_session,
        ));

    let login = get(session::login_page).merge(post(session::login).route_layer(
        middleware::from_fn_with_state(rate_limits.clone(), rate_limit_login),
    ));
    let register = get(session::register_page).merge(post(session::register).route_layer(
        middleware::from_fn_with_state(rate_limits, rate_limit_register),
    ));

    Router::new()
        .merge(protected)
        .route("/login", login)
        .route("/register", register)
        .route("/logout", get(session::logout))
        .route("/movies", get(movies::browse))
        .route("/api/movies/{id}", get(movies::movie_details))
        .route("/api/comments/{id}", get(movies::movie_comments))
        .with_state(state)
}
