//! Directed, typed edges between requirements.

use reqhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `requirement_relationships` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RequirementRelationship {
    pub id: DbId,
    pub source_requirement_id: DbId,
    pub target_requirement_id: DbId,
    pub relationship_type_id: DbId,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A relationship joined with its type name and both endpoint references.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RelationshipView {
    pub id: DbId,
    pub source_requirement_id: DbId,
    pub source_reference_id: String,
    pub target_requirement_id: DbId,
    pub target_reference_id: String,
    pub relationship_type_id: DbId,
    pub relationship_type: String,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

#[derive(Debug)]
pub struct NewRelationship {
    pub source_requirement_id: DbId,
    pub target_requirement_id: DbId,
    pub relationship_type_id: DbId,
    pub created_by: DbId,
}
