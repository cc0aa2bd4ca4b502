//! Epic model and DTOs.

use reqhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `epics` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Epic {
    pub id: DbId,
    pub reference_id: String,
    #[serde(skip_serializing)]
    pub sequence_number: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub priority: i16,
    pub status: String,
    pub creator_id: DbId,
    pub assignee_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Validated insert payload. The id and reference are allocated by the caller.
#[derive(Debug)]
pub struct NewEpic {
    pub id: DbId,
    pub reference_id: String,
    pub sequence_number: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub priority: i16,
    pub status: String,
    pub creator_id: DbId,
    pub assignee_id: Option<DbId>,
}

/// Partial update. `None` leaves the column unchanged.
#[derive(Debug, Default)]
pub struct UpdateEpic {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i16>,
}
