//! Refresh tokens and personal access tokens.

use reqhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `refresh_tokens` table.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: DbId,
    pub user_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `personal_access_tokens` table.
///
/// `token_hash` is never serialized; `token_prefix` identifies the token
/// in listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PersonalAccessToken {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub token_prefix: String,
    pub expires_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new PAT.
#[derive(Debug)]
pub struct CreatePersonalAccessToken {
    pub user_id: DbId,
    pub name: String,
    pub token_hash: String,
    pub token_prefix: String,
    pub expires_at: Timestamp,
}
