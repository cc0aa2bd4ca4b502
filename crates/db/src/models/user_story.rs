//! User story model and DTOs.

use reqhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_stories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserStory {
    pub id: DbId,
    pub reference_id: String,
    #[serde(skip_serializing)]
    pub sequence_number: Option<i32>,
    pub epic_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub priority: i16,
    pub status: String,
    pub creator_id: DbId,
    pub assignee_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug)]
pub struct NewUserStory {
    pub id: DbId,
    pub reference_id: String,
    pub sequence_number: Option<i32>,
    pub epic_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub priority: i16,
    pub status: String,
    pub creator_id: DbId,
    pub assignee_id: Option<DbId>,
}

#[derive(Debug, Default)]
pub struct UpdateUserStory {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i16>,
}
