use sqlx::sqlite::SqlitePool;

use super::StoreError;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// PHC-encoded password hash. Never leaves the auth layer.
    pub password_hash: String,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i64,
    username: String,
    hashed_password: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.user_id,
            username: row.username,
            password_hash: row.hashed_password,
        }
    }
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new user. Returns the user ID, or `DuplicateUsername` when
    /// the unique constraint on `username` rejects the row.
    pub async fn create(&self, username: &str, password_hash: &str) -> Result<i64, StoreError> {
        let result = sqlx::query("INSERT INTO users (username, hashed_password) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let duplicate = e
                    .as_database_error()
                    .is_some_and(|db_err| db_err.is_unique_violation());
                if duplicate {
                    StoreError::DuplicateUsername
                } else {
                    StoreError::from(e)
                }
            })?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT user_id, username, hashed_password FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT user_id, username, hashed_password FROM users WHERE user_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }
}
