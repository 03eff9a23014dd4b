use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;

use super::StoreError;

/// A cached movie row. `movie_id` is the upstream IMDb id.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Movie {
    pub movie_id: String,
    pub title: String,
    pub actors: Option<String>,
    pub genre: Option<String>,
    pub runtime: Option<String>,
    pub age_rating: Option<String>,
    pub imdb_rating: Option<String>,
    pub rotten_tomatoes_rating: Option<String>,
    pub metacritic_rating: Option<String>,
    pub poster_url: Option<String>,
    /// ISO 8601 date (YYYY-MM-DD)
    pub release_date: Option<String>,
    pub director: Option<String>,
    pub description: Option<String>,
    pub user_rating: Option<i64>,
}

/// User-editable movie fields.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieEdit {
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub release_date: Option<String>,
    pub director: Option<String>,
    pub user_rating: Option<i64>,
}

/// `SELECT <all movie columns> FROM movies <rest>` as a static string.
macro_rules! select_movies {
    ($rest:literal) => {
        concat!(
            "SELECT movie_id, title, actors, genre, runtime, age_rating, imdb_rating, ",
            "rotten_tomatoes_rating, metacritic_rating, poster_url, release_date, director, ",
            "description, user_rating FROM movies ",
            $rest
        )
    };
}

pub struct MovieStore {
    pool: SqlitePool,
}

/// Escape LIKE wildcards so a keyword matches literally.
fn escape_like(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl MovieStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A page of cached movies in insertion order.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Movie>, StoreError> {
        let rows = sqlx::query_as(select_movies!("ORDER BY rowid LIMIT ? OFFSET ?"))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, movie_id: &str) -> Result<Option<Movie>, StoreError> {
        let row = sqlx::query_as(select_movies!("WHERE movie_id = ?"))
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn exists(&self, movie_id: &str) -> Result<bool, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movies WHERE movie_id = ?")
            .bind(movie_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    /// Movies whose title contains `keyword` (case-insensitive).
    pub async fn search_title(&self, keyword: &str) -> Result<Vec<Movie>, StoreError> {
        let pattern = format!("%{}%", escape_like(keyword));
        let rows = sqlx::query_as(select_movies!(
            "WHERE title LIKE ? ESCAPE '\\' ORDER BY title"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert a movie or refresh its upstream fields. `user_rating` is local
    /// data and survives an upsert.
    pub async fn upsert(&self, movie: &Movie) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO movies (movie_id, title, actors, genre, runtime, age_rating, imdb_rating,
                rotten_tomatoes_rating, metacritic_rating, poster_url, release_date, director, description)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(movie_id) DO UPDATE SET
                title = excluded.title,
                actors = excluded.actors,
                genre = excluded.genre,
                runtime = excluded.runtime,
                age_rating = excluded.age_rating,
                imdb_rating = excluded.imdb_rating,
                rotten_tomatoes_rating = excluded.rotten_tomatoes_rating,
                metacritic_rating = excluded.metacritic_rating,
                poster_url = excluded.poster_url,
                release_date = excluded.release_date,
                director = excluded.director,
                description = excluded.description",
        )
        .bind(&movie.movie_id)
        .bind(&movie.title)
        .bind(&movie.actors)
        .bind(&movie.genre)
        .bind(&movie.runtime)
        .bind(&movie.age_rating)
        .bind(&movie.imdb_rating)
        .bind(&movie.rotten_tomatoes_rating)
        .bind(&movie.metacritic_rating)
        .bind(&movie.poster_url)
        .bind(&movie.release_date)
        .bind(&movie.director)
        .bind(&movie.description)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Apply a user edit. Returns false if the movie does not exist.
    pub async fn update_details(&self, movie_id: &str, edit: &MovieEdit) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE movies SET title = ?, description = ?, genre = ?, release_date = ?, director = ?, user_rating = ?
             WHERE movie_id = ?",
        )
        .bind(&edit.title)
        .bind(&edit.description)
        .bind(&edit.genre)
        .bind(&edit.release_date)
        .bind(&edit.director)
        .bind(edit.user_rating)
        .bind(movie_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
