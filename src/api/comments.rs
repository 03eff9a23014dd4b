//! Movie comments.

use axum::{
    Form, Json,
    extract::{Query, State},
    response::Response,
};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ResultExt};
use super::{AppState, store_failure_notice};
use crate::auth::CurrentUser;
use crate::db::Movie;
use crate::redirect::{Notice, found, found_with_notice};

const ADD_COMMENT_PATH: &str = "/addComment";

#[derive(Deserialize)]
pub(super) struct CommentQuery {
    #[serde(default)]
    movie_id: String,
}

#[derive(Deserialize)]
pub(super) struct CommentForm {
    #[serde(default)]
    movie_id: String,
    #[serde(rename = "newComment", default)]
    new_comment: String,
}

#[derive(Serialize)]
pub(super) struct CommentPage {
    username: String,
    movie: Option<Movie>,
}

/// GET /addComment?movie_id=
pub(super) async fn comment_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<CommentQuery>,
) -> Result<Json<CommentPage>, ApiError> {
    let account = state
        .db
        .users()
        .get_by_id(user.user_id)
        .await
        .db_err("Failed to load user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let movie = state
        .db
        .movies()
        .get(&query.movie_id)
        .await
        .db_err("Failed to load movie")?;

    Ok(Json(CommentPage {
        username: account.username,
        movie,
    }))
}

/// POST /addComment - the comment is attributed to the signed-in user.
pub(super) async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<CommentForm>,
) -> Response {
    let back = |notice: Notice| found_with_notice_for(&form.movie_id, notice);

    let comment = form.new_comment.trim();
    if comment.is_empty() {
        return back(Notice::warning("Comment cannot be empty"));
    }

    match state.db.movies().exists(&form.movie_id).await {
        Ok(true) => {}
        Ok(false) => return found_with_notice("/", Notice::danger("Movie not found")),
        Err(e) => return back(store_failure_notice("Failed to look up movie", e)),
    }

    let username = match state.db.users().get_by_id(user.user_id).await {
        Ok(Some(account)) => account.username,
        // The account vanished behind a still-valid access token.
        Ok(None) => return found("/logout"),
        Err(e) => return back(store_failure_notice("Failed to load user", e)),
    };

    match state
        .db
        .comments()
        .create(&form.movie_id, &username, comment)
        .await
    {
        Ok(_) => back(Notice::success("Comment Added!")),
        Err(e) => back(store_failure_notice("Failed to add comment", e)),
    }
}

fn found_with_notice_for(movie_id: &str, notice: Notice) -> Response {
    found(&notice.location_with(ADD_COMMENT_PATH, &[("movie_id", movie_id)]))
}
