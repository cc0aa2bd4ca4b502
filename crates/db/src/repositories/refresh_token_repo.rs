//! Repository for the `refresh_tokens` table.

use reqhub_core::types::{DbId, Timestamp};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::token::RefreshToken;

const COLUMNS: &str = "id, user_id, token_hash, expires_at, last_used_at, created_at, updated_at";

/// Stores refresh tokens by SHA-256 digest; plaintext is never persisted.
pub struct RefreshTokenRepo;

impl RefreshTokenRepo {
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        user_id: DbId,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<RefreshToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(token_hash)
            .bind(expires_at)
            .fetch_one(db)
            .await
    }

    /// Find a token by digest, expired or not, locking the row so two
    /// concurrent refreshes cannot both rotate it.
    pub async fn find_by_hash_for_update<'e>(
        db: impl PgExecutor<'e>,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM refresh_tokens WHERE token_hash = $1 FOR UPDATE");
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(token_hash)
            .fetch_optional(db)
            .await
    }

    pub async fn touch<'e>(db: impl PgExecutor<'e>, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE refresh_tokens SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Delete a single token. Returns `true` if a row was removed.
    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the token with this digest if it belongs to `user_id`.
    pub async fn delete_by_hash_for_user<'e>(
        db: impl PgExecutor<'e>,
        user_id: DbId,
        token_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1 AND user_id = $2")
                .bind(token_hash)
                .bind(user_id)
                .execute(db)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_all_for_user<'e>(
        db: impl PgExecutor<'e>,
        user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete expired tokens. Returns the count of deleted rows.
    pub async fn delete_expired<'e>(db: impl PgExecutor<'e>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}
