use serde::Serialize;
use sqlx::sqlite::SqlitePool;

use super::StoreError;

/// A comment joined with the title of the movie it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CommentView {
    pub title: String,
    pub username: String,
    pub comment: String,
}

pub struct CommentStore {
    pool: SqlitePool,
}

impl CommentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        movie_id: &str,
        username: &str,
        comment: &str,
    ) -> Result<i64, StoreError> {
        let result =
            sqlx::query("INSERT INTO comments (movie_id, username, comment) VALUES (?, ?, ?)")
                .bind(movie_id)
                .bind(username)
                .bind(comment)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Comments on a movie, oldest first.
    pub async fn list_for_movie(&self, movie_id: &str) -> Result<Vec<CommentView>, StoreError> {
        let rows = sqlx::query_as(
            "SELECT m.title, c.username, c.comment FROM comments c
             JOIN movies m ON m.movie_id = c.movie_id
             WHERE c.movie_id = ? ORDER BY c.comment_id",
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
