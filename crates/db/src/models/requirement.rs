//! Requirement model and DTOs.

use reqhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `requirements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Requirement {
    pub id: DbId,
    pub reference_id: String,
    #[serde(skip_serializing)]
    pub sequence_number: Option<i32>,
    pub user_story_id: DbId,
    pub acceptance_criteria_id: Option<DbId>,
    pub requirement_type_id: DbId,
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
pub struct NewRequirement {
    pub id: DbId,
    pub reference_id: String,
    pub sequence_number: Option<i32>,
    pub user_story_id: DbId,
    pub acceptance_criteria_id: Option<DbId>,
    pub requirement_type_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub priority: i16,
    pub status: String,
    pub creator_id: DbId,
    pub assignee_id: Option<DbId>,
}

/// Partial update. `acceptance_criteria_id` uses a nested option so the
/// link can be cleared (`Some(None)`) as well as left alone (`None`).
#[derive(Debug, Default)]
pub struct UpdateRequirement {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i16>,
    pub requirement_type_id: Option<DbId>,
    pub acceptance_criteria_id: Option<Option<DbId>>,
}
