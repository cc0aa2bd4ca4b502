//! Name/description lookup tables: `requirement_types` and `relationship_types`.

use reqhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from either lookup table. Both share the same shape.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LookupType {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub type RequirementType = LookupType;
pub type RelationshipType = LookupType;

#[derive(Debug)]
pub struct CreateLookupType {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default)]
pub struct UpdateLookupType {
    pub name: Option<String>,
    pub description: Option<String>,
}
