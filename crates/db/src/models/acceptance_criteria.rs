//! Acceptance criteria model and DTOs.
//!
//! Acceptance criteria carry free text only (EARS wording is recommended,
//! never enforced) and have no status, priority or assignee.

use reqhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `acceptance_criteria` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AcceptanceCriteria {
    pub id: DbId,
    pub reference_id: String,
    #[serde(skip_serializing)]
    pub sequence_number: Option<i32>,
    pub user_story_id: DbId,
    pub description: String,
    pub author_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug)]
pub struct NewAcceptanceCriteria {
    pub id: DbId,
    pub reference_id: String,
    pub sequence_number: Option<i32>,
    pub user_story_id: DbId,
    pub description: String,
    pub author_id: DbId,
}
