//! Catalog endpoints: browsing, search, movie details and edits.

use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::Response,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ResultExt};
use super::{AppState, NoticeQuery, NoticeView, store_failure_notice};
use crate::auth::CurrentUser;
use crate::db::{CommentView, Movie, MovieEdit};
use crate::redirect::{Notice, found_with_notice};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 50;

#[derive(Deserialize)]
pub(super) struct PageQuery {
    offset: Option<String>,
    limit: Option<String>,
}

impl PageQuery {
    /// Unparseable, negative or missing values fall back to the defaults.
    fn resolve(&self) -> (i64, i64) {
        let parse = |raw: &Option<String>| raw.as_deref().and_then(|v| v.trim().parse::<i64>().ok());
        let offset = parse(&self.offset).filter(|o| *o >= 0).unwrap_or(0);
        let limit = parse(&self.limit)
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        (limit, offset)
    }
}

#[derive(Deserialize)]
pub(super) struct SearchQuery {
    #[serde(default)]
    search: String,
    #[serde(flatten)]
    notice: NoticeQuery,
}

#[derive(Serialize)]
pub(super) struct SearchView {
    keyword: String,
    movies: Vec<Movie>,
    #[serde(flatten)]
    notice: NoticeView,
}

#[derive(Deserialize)]
pub(super) struct EditQuery {
    #[serde(rename = "movieId")]
    movie_id: String,
}

#[derive(Deserialize)]
pub(super) struct EditForm {
    #[serde(default)]
    movie_id: String,
    #[serde(default)]
    title: String,
    description: Option<String>,
    genre: Option<String>,
    release_date: Option<String>,
    director: Option<String>,
    user_rating: Option<String>,
}

/// Blank form fields mean "no value".
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl EditForm {
    fn into_edit(self) -> Result<(String, MovieEdit), Notice> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(Notice::warning("Title is required"));
        }

        let release_date = non_blank(self.release_date);
        if let Some(date) = &release_date {
            if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                return Err(Notice::warning("Release date must be YYYY-MM-DD"));
            }
        }

        let user_rating = match non_blank(self.user_rating) {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| Notice::warning("Rating must be a whole number"))?,
            ),
            None => None,
        };

        Ok((
            self.movie_id,
            MovieEdit {
                title,
                description: non_blank(self.description),
                genre: non_blank(self.genre),
                release_date,
                director: non_blank(self.director),
                user_rating,
            },
        ))
    }
}

/// GET /movies - a page of the catalog, filled from the source on a miss.
pub(super) async fn browse(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let (limit, offset) = page.resolve();
    let rows = state
        .catalog
        .browse(limit, offset)
        .await
        .db_err("Failed to load movies")?;
    Ok(Json(rows))
}

/// GET /searchResults
pub(super) async fn search_results(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchView>, ApiError> {
    let movies = state
        .catalog
        .search(&query.search)
        .await
        .db_err("Failed to search movies")?;
    Ok(Json(SearchView {
        keyword: query.search,
        movies,
        notice: query.notice.into(),
    }))
}

/// GET /api/movies/{id} - zero or one rows.
pub(super) async fn movie_details(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let movie = state
        .db
        .movies()
        .get(&movie_id)
        .await
        .db_err("Failed to load movie")?;
    Ok(Json(movie.into_iter().collect()))
}

/// GET /api/comments/{id}
pub(super) async fn movie_comments(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let rows = state
        .db
        .comments()
        .list_for_movie(&movie_id)
        .await
        .db_err("Failed to load comments")?;
    Ok(Json(rows))
}

/// GET /movie/edit?movieId=
pub(super) async fn edit_form(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<EditQuery>,
) -> Result<Json<Movie>, ApiError> {
    state
        .db
        .movies()
        .get(&query.movie_id)
        .await
        .db_err("Failed to load movie")?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Movie not found"))
}

/// POST /movie/edit
pub(super) async fn edit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<EditForm>,
) -> Response {
    let (movie_id, edit) = match form.into_edit() {
        Ok(parsed) => parsed,
        Err(notice) => return found_with_notice("/", notice),
    };

    match state.db.movies().update_details(&movie_id, &edit).await {
        Ok(true) => {
            tracing::info!(user_id = user.user_id, movie_id = %movie_id, "Movie updated");
            found_with_notice("/", Notice::success("Movie successfully updated!"))
        }
        Ok(false) => found_with_notice("/", Notice::danger("Movie not found")),
        Err(e) => found_with_notice("/", store_failure_notice("Failed to update movie", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(offset: Option<&str>, limit: Option<&str>) -> (i64, i64) {
        PageQuery {
            offset: offset.map(String::from),
            limit: limit.map(String::from),
        }
        .resolve()
    }

    #[test]
    fn test_page_defaults_and_cap() {
        assert_eq!(page(None, None), (10, 0));
        assert_eq!(page(Some("20"), Some("5")), (5, 20));
        assert_eq!(page(Some("-1"), Some("0")), (10, 0));
        assert_eq!(page(Some("abc"), Some("1000")), (50, 0));
    }

    fn form(rating: &str, date: &str) -> EditForm {
        EditForm {
            movie_id: "tt1".to_string(),
            title: " Superman ".to_string(),
            description: Some(String::new()),
            genre: Some("Action".to_string()),
            release_date: Some(date.to_string()),
            director: None,
            user_rating: Some(rating.to_string()),
        }
    }

    #[test]
    fn test_edit_form_normalizes_blanks() {
        let (id, edit) = form("8", "1978-12-15").into_edit().unwrap();
        assert_eq!(id, "tt1");
        assert_eq!(edit.title, "Superman");
        assert_eq!(edit.description, None);
        assert_eq!(edit.user_rating, Some(8));

        let (_, edit) = form("", "").into_edit().unwrap();
        assert_eq!(edit.user_rating, None);
        assert_eq!(edit.release_date, None);
    }

    #[test]
    fn test_edit_form_rejects_bad_values() {
        assert!(form("eight", "").into_edit().is_err());
        assert!(form("", "15 Dec 1978").into_edit().is_err());
    }
}
