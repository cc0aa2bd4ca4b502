//! Repository for the `personal_access_tokens` table.

use reqhub_core::types::DbId;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::token::{CreatePersonalAccessToken, PersonalAccessToken};

const COLUMNS: &str = "id, user_id, name, token_hash, token_prefix, expires_at, \
                       last_used_at, created_at, updated_at";

/// Provides PAT issue, lookup and revocation.
pub struct PatRepo;

impl PatRepo {
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        input: &CreatePersonalAccessToken,
    ) -> Result<PersonalAccessToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO personal_access_tokens
                (id, user_id, name, token_hash, token_prefix, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PersonalAccessToken>(&query)
            .bind(Uuid::new_v4())
            .bind(input.user_id)
            .bind(&input.name)
            .bind(&input.token_hash)
            .bind(&input.token_prefix)
            .bind(input.expires_at)
            .fetch_one(db)
            .await
    }

    /// Look up a token by its SHA-256 digest (indexed). Expiry is checked by
    /// the caller so expired use can be reported.
    pub async fn find_by_hash<'e>(
        db: impl PgExecutor<'e>,
        token_hash: &str,
    ) -> Result<Option<PersonalAccessToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM personal_access_tokens WHERE token_hash = $1");
        sqlx::query_as::<_, PersonalAccessToken>(&query)
            .bind(token_hash)
            .fetch_optional(db)
            .await
    }

    pub async fn list_for_user<'e>(
        db: impl PgExecutor<'e>,
        user_id: DbId,
    ) -> Result<Vec<PersonalAccessToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM personal_access_tokens
             WHERE user_id = $1
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, PersonalAccessToken>(&query)
            .bind(user_id)
            .fetch_all(db)
            .await
    }

    pub async fn touch<'e>(db: impl PgExecutor<'e>, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE personal_access_tokens SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Revoke one of the user's tokens. Returns the deleted row, if any.
    pub async fn delete_for_user<'e>(
        db: impl PgExecutor<'e>,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<PersonalAccessToken>, sqlx::Error> {
        let query = format!(
            "DELETE FROM personal_access_tokens WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PersonalAccessToken>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(db)
            .await
    }

    /// Delete expired tokens. Returns the count of deleted rows.
    pub async fn delete_expired<'e>(db: impl PgExecutor<'e>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM personal_access_tokens WHERE expires_at < NOW()")
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}
