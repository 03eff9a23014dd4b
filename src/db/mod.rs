mod comments;
mod lists;
mod movies;
mod token;
mod user;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub use comments::{CommentStore, CommentView};
pub use lists::{ListKind, ListStore, ListedMovie};
pub use movies::{Movie, MovieEdit, MovieStore};
pub use token::{RefreshTokenRecord, RefreshTokenStore, hash_token};
pub use user::{User, UserStore};

/// Maximum number of pooled connections.
const POOL_CAPACITY: u32 = 10;

/// How long a request waits for a pooled connection before the store is
/// reported unavailable.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Store-layer failures. "No such row" is never an error; lookups return
/// `Option`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists")]
    DuplicateUsername,
    #[error("store unavailable: {0}")]
    Unavailable(sqlx::Error),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e)
            }
            other => StoreError::Database(other),
        }
    }
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    /// Use ":memory:" for an in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let options = if path == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path))?
                .journal_mode(SqliteJournalMode::Wal)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(POOL_CAPACITY)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options.busy_timeout(Duration::from_secs(5)))
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the current schema version.
    async fn get_version(&self) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|r| r.0).unwrap_or(0))
    }

    /// Set the schema version within a transaction.
    async fn set_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        version: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM schema_version")
            .execute(&mut **tx)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let version = self.get_version().await?;

        if version < 1 {
            self.migrate_v1().await?;
        }

        Ok(())
    }

    /// Execute a list of queries in a transaction, then set the version.
    async fn run_migration(
        &self,
        version: i32,
        queries: &[&'static str],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for query in queries {
            sqlx::query(*query).execute(&mut *tx).await?;
        }
        Self::set_version(&mut tx, version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn migrate_v1(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            1,
            &[
                "CREATE TABLE users (
                    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    hashed_password TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                // Only the SHA-256 of a refresh token is stored. is_used flips
                // 0 -> 1 exactly once.
                "CREATE TABLE refresh_tokens (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
                    refresh_token TEXT UNIQUE NOT NULL,
                    is_used INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_refresh_tokens_user_id ON refresh_tokens(user_id)",
                "CREATE TABLE movies (
                    movie_id TEXT PRIMARY KEY NOT NULL,
                    title TEXT NOT NULL,
                    actors TEXT,
                    genre TEXT,
                    runtime TEXT,
                    age_rating TEXT,
                    imdb_rating TEXT,
                    rotten_tomatoes_rating TEXT,
                    metacritic_rating TEXT,
                    poster_url TEXT,
                    release_date TEXT,
                    director TEXT,
                    description TEXT,
                    user_rating INTEGER
                )",
                "CREATE INDEX idx_movies_title ON movies(title)",
                "CREATE TABLE watchlists (
                    user_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
                    movie_id TEXT NOT NULL REFERENCES movies(movie_id) ON DELETE CASCADE,
                    added_at TEXT NOT NULL DEFAULT (datetime('now')),
                    PRIMARY KEY (user_id, movie_id)
                )",
                "CREATE TABLE favorites (
                    user_id INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
                    movie_id TEXT NOT NULL REFERENCES movies(movie_id) ON DELETE CASCADE,
                    added_at TEXT NOT NULL DEFAULT (datetime('now')),
                    PRIMARY KEY (user_id, movie_id)
                )",
                "CREATE TABLE comments (
                    comment_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    movie_id TEXT NOT NULL REFERENCES movies(movie_id) ON DELETE CASCADE,
                    username TEXT NOT NULL,
                    comment TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_comments_movie_id ON comments(movie_id)",
            ],
        )
        .await
    }

    /// Get the user store.
    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    /// Get the refresh token store.
    pub fn refresh_tokens(&self) -> RefreshTokenStore {
        RefreshTokenStore::new(self.pool.clone())
    }

    /// Get the movie store.
    pub fn movies(&self) -> MovieStore {
        MovieStore::new(self.pool.clone())
    }

    /// Get a per-user movie list store (watchlist or favorites).
    pub fn list(&self, kind: ListKind) -> ListStore {
        ListStore::new(self.pool.clone(), kind)
    }

    /// Get the comment store.
    pub fn comments(&self) -> CommentStore {
        CommentStore::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::open(":memory:").await.unwrap();
        db.migrate().await.unwrap();
        assert_eq!(db.get_version().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_pool_timeout_maps_to_unavailable() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Unavailable(_)));

        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
