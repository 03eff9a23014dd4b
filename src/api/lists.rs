//! Watchlist and favorites.

use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::error::{ApiError, ResultExt};
use super::{AppState, store_failure_notice};
use crate::auth::CurrentUser;
use crate::db::{ListKind, ListedMovie};
use crate::redirect::{Notice, found_with_notice};

#[derive(Deserialize)]
pub(super) struct AddToWatchlistForm {
    #[serde(rename = "btnAddWatchlist")]
    movie_id: String,
}

#[derive(Deserialize)]
pub(super) struct AddToFavoritesForm {
    #[serde(rename = "btnAddFavorite")]
    movie_id: String,
}

fn added_notice(kind: ListKind, added: bool) -> Notice {
    match (kind, added) {
        (ListKind::Watchlist, true) => Notice::success("Movie Added To Watchlist!"),
        (ListKind::Watchlist, false) => Notice::warning("Movie Already In Watchlist!"),
        (ListKind::Favorites, true) => Notice::success("Movie Added To Favorites!"),
        (ListKind::Favorites, false) => Notice::warning("Movie Already In Favorites!"),
    }
}

async fn list_movies(
    state: &AppState,
    user_id: i64,
    kind: ListKind,
) -> Result<Json<Vec<ListedMovie>>, ApiError> {
    let rows = state
        .db
        .list(kind)
        .list(user_id)
        .await
        .db_err("Failed to load list")?;
    Ok(Json(rows))
}

async fn add_movie(state: &AppState, user_id: i64, kind: ListKind, movie_id: &str) -> Response {
    match state.db.movies().exists(movie_id).await {
        Ok(true) => {}
        Ok(false) => return found_with_notice("/", Notice::danger("Movie not found")),
        Err(e) => return found_with_notice("/", store_failure_notice("Failed to look up movie", e)),
    }

    match state.db.list(kind).add(user_id, movie_id).await {
        Ok(added) => found_with_notice("/", added_notice(kind, added)),
        Err(e) => found_with_notice("/", store_failure_notice("Failed to add movie to list", e)),
    }
}

/// GET /watchlist
pub(super) async fn watchlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ListedMovie>>, ApiError> {
    list_movies(&state, user.user_id, ListKind::Watchlist).await
}

/// GET /favorites
pub(super) async fn favorites(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ListedMovie>>, ApiError> {
    list_movies(&state, user.user_id, ListKind::Favorites).await
}

/// POST /addTowatchlist
pub(super) async fn add_to_watchlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<AddToWatchlistForm>,
) -> impl IntoResponse {
    add_movie(&state, user.user_id, ListKind::Watchlist, &form.movie_id).await
}

/// POST /addToFavorites
pub(super) async fn add_to_favorites(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<AddToFavoritesForm>,
) -> impl IntoResponse {
    add_movie(&state, user.user_id, ListKind::Favorites, &form.movie_id).await
}
