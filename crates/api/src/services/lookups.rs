//! Administration of the two lookup tables: requirement types and
//! relationship types. Both share one shape and one set of rules.

use reqhub_core::error::CoreError;
use reqhub_core::types::DbId;
use reqhub_db::models::lookup::{CreateLookupType, LookupType, UpdateLookupType};
use reqhub_db::repositories::{RelationshipRepo, RelationshipTypeRepo, RequirementTypeRepo};
use reqhub_db::DbPool;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

/// Maximum length of a lookup type name.
pub const MAX_LOOKUP_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    RequirementType,
    RelationshipType,
}

impl LookupKind {
    fn entity_name(self) -> &'static str {
        match self {
            LookupKind::RequirementType => "RequirementType",
            LookupKind::RelationshipType => "RelationshipType",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLookupInput {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLookupInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

fn validate_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("name must not be empty".into()).into());
    }
    if trimmed.chars().count() > MAX_LOOKUP_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "name must be at most {MAX_LOOKUP_NAME_LENGTH} characters"
        ))
        .into());
    }
    Ok(trimmed.to_string())
}

pub async fn list(pool: &DbPool, kind: LookupKind) -> AppResult<Vec<LookupType>> {
    Ok(match kind {
        LookupKind::RequirementType => RequirementTypeRepo::list(pool).await?,
        LookupKind::RelationshipType => RelationshipTypeRepo::list(pool).await?,
    })
}

pub async fn get(pool: &DbPool, kind: LookupKind, id: DbId) -> AppResult<LookupType> {
    let found = match kind {
        LookupKind::RequirementType => RequirementTypeRepo::find_by_id(pool, id).await?,
        LookupKind::RelationshipType => RelationshipTypeRepo::find_by_id(pool, id).await?,
    };
    found.ok_or_else(|| CoreError::not_found(kind.entity_name(), id).into())
}

pub async fn create(
    pool: &DbPool,
    actor: &AuthUser,
    kind: LookupKind,
    input: CreateLookupInput,
) -> AppResult<LookupType> {
    let input = CreateLookupType {
        name: validate_name(&input.name)?,
        description: input.description,
    };
    let created = match kind {
        LookupKind::RequirementType => RequirementTypeRepo::create(pool, &input).await?,
        LookupKind::RelationshipType => RelationshipTypeRepo::create(pool, &input).await?,
    };
    tracing::info!(
        kind = kind.entity_name(),
        id = %created.id,
        name = %created.name,
        actor_id = %actor.user_id,
        "Lookup type created"
    );
    Ok(created)
}

pub async fn update(
    pool: &DbPool,
    actor: &AuthUser,
    kind: LookupKind,
    id: DbId,
    input: UpdateLookupInput,
) -> AppResult<LookupType> {
    let input = UpdateLookupType {
        name: input.name.as_deref().map(validate_name).transpose()?,
        description: input.description,
    };
    let updated = match kind {
        LookupKind::RequirementType => RequirementTypeRepo::update(pool, id, &input).await?,
        LookupKind::RelationshipType => RelationshipTypeRepo::update(pool, id, &input).await?,
    }
    .ok_or_else(|| CoreError::not_found(kind.entity_name(), id))?;

    tracing::info!(kind = kind.entity_name(), id = %id, actor_id = %actor.user_id, "Lookup type updated");
    Ok(updated)
}

/// Delete a type that nothing references.
pub async fn delete(pool: &DbPool, actor: &AuthUser, kind: LookupKind, id: DbId) -> AppResult<()> {
    let existing = get(pool, kind, id).await?;
    let usage = match kind {
        LookupKind::RequirementType => RequirementTypeRepo::usage_count(pool, id).await?,
        LookupKind::RelationshipType => RelationshipRepo::count_for_type(pool, id).await?,
    };
    if usage > 0 {
        return Err(CoreError::InUse(format!(
            "'{}' is used by {usage} records and cannot be deleted",
            existing.name
        ))
        .into());
    }

    match kind {
        LookupKind::RequirementType => RequirementTypeRepo::delete(pool, id).await?,
        LookupKind::RelationshipType => RelationshipTypeRepo::delete(pool, id).await?,
    };
    tracing::info!(kind = kind.entity_name(), id = %id, actor_id = %actor.user_id, "Lookup type deleted");
    Ok(())
}
