//! Refresh token bookkeeping.
//!
//! Only a SHA-256 digest of each issued refresh token is stored, with an
//! `is_used` flag that flips exactly once. Redemption is a single conditional
//! update, so two requests presenting the same token can never both succeed.
//! Access tokens are stateless and never stored.

use sha2::{Digest, Sha256};
use sqlx::sqlite::SqlitePool;

use super::StoreError;

/// One issued refresh token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(rename = "refresh_token")]
    pub token_hash: String,
    pub is_used: bool,
    pub created_at: String,
}

/// One-way digest of a raw refresh token, hex encoded.
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

pub struct RefreshTokenStore {
    pool: SqlitePool,
}

impl RefreshTokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a newly issued refresh token as unused.
    pub async fn create(&self, user_id: i64, token_hash: &str) -> Result<i64, StoreError> {
        let result =
            sqlx::query("INSERT INTO refresh_tokens (user_id, refresh_token) VALUES (?, ?)")
                .bind(user_id)
                .bind(token_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Look up a token record regardless of its used flag.
    pub async fn get_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let row = sqlx::query_as(
            "SELECT id, user_id, refresh_token, is_used, created_at FROM refresh_tokens WHERE refresh_token = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Look up a token record that has not been redeemed yet.
    pub async fn find_unused(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let row = sqlx::query_as(
            "SELECT id, user_id, refresh_token, is_used, created_at FROM refresh_tokens WHERE refresh_token = ? AND is_used = 0",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Flip the used flag if it is still unset. Returns whether this call
    /// performed the flip.
    pub async fn mark_used(&self, token_hash: &str) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE refresh_tokens SET is_used = 1 WHERE refresh_token = ? AND is_used = 0")
                .bind(token_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Redeem `old_hash` and record `new_hash` as its successor in one
    /// transaction. Returns false (and changes nothing) when `old_hash` is
    /// unknown, already used, or owned by a different user.
    pub async fn rotate(
        &self,
        old_hash: &str,
        user_id: i64,
        new_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let owner: Option<i64> = sqlx::query_scalar(
            "UPDATE refresh_tokens SET is_used = 1 WHERE refresh_token = ? AND is_used = 0 RETURNING user_id",
        )
        .bind(old_hash)
        .fetch_optional(&mut *tx)
        .await?;

        if owner != Some(user_id) {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("INSERT INTO refresh_tokens (user_id, refresh_token) VALUES (?, ?)")
            .bind(user_id)
            .bind(new_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// List all token records for a user, newest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<RefreshTokenRecord>, StoreError> {
        let rows = sqlx::query_as(
            "SELECT id, user_id, refresh_token, is_used, created_at FROM refresh_tokens WHERE user_id = ? ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
