//! Per-user movie lists: watchlist and favorites share one shape.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

use super::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Watchlist,
    Favorites,
}

impl ListKind {
    fn insert_sql(self) -> &'static str {
        match self {
            ListKind::Watchlist => {
                "INSERT OR IGNORE INTO watchlists (user_id, movie_id) VALUES (?, ?)"
            }
            ListKind::Favorites => {
                "INSERT OR IGNORE INTO favorites (user_id, movie_id) VALUES (?, ?)"
            }
        }
    }

    fn select_sql(self) -> &'static str {
        match self {
            ListKind::Watchlist => {
                "SELECT m.movie_id, m.poster_url, m.title FROM watchlists w
                 JOIN movies m ON m.movie_id = w.movie_id
                 WHERE w.user_id = ? ORDER BY w.added_at, m.title"
            }
            ListKind::Favorites => {
                "SELECT m.movie_id, m.poster_url, m.title FROM favorites f
                 JOIN movies m ON m.movie_id = f.movie_id
                 WHERE f.user_id = ? ORDER BY f.added_at, m.title"
            }
        }
    }
}

/// A movie as shown in a user's list.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ListedMovie {
    pub movie_id: String,
    pub poster_url: Option<String>,
    pub title: String,
}

pub struct ListStore {
    pool: SqlitePool,
    kind: ListKind,
}

impl ListStore {
    pub fn new(pool: SqlitePool, kind: ListKind) -> Self {
        Self { pool, kind }
    }

    /// Add a movie to the user's list. Returns false if it was already there.
    pub async fn add(&self, user_id: i64, movie_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(self.kind.insert_sql())
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<ListedMovie>, StoreError> {
        let rows = sqlx::query_as(self.kind.select_sql())
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
