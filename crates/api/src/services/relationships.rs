//! Typed, directed edges between requirements.

use reqhub_core::error::CoreError;
use reqhub_core::pagination::Page;
use reqhub_core::types::DbId;
use reqhub_db::models::relationship::{NewRelationship, RelationshipView};
use reqhub_db::repositories::{RelationshipRepo, RelationshipTypeRepo};
use reqhub_db::DbPool;
use serde::Deserialize;

use super::{non_blank, requirements};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;

#[derive(Debug, Deserialize)]
pub struct CreateRelationshipInput {
    /// Source requirement, by UUID or reference.
    pub source_requirement_id: String,
    /// Target requirement, by UUID or reference.
    pub target_requirement_id: String,
    pub relationship_type_id: Option<DbId>,
    /// Type by name (case-insensitive), used when no id is given.
    pub relationship_type: Option<String>,
}

pub async fn create(
    pool: &DbPool,
    actor: &AuthUser,
    input: CreateRelationshipInput,
) -> AppResult<RelationshipView> {
    let mut tx = pool.begin().await?;

    let source = requirements::find(&mut *tx, &input.source_requirement_id).await?;
    let target = requirements::find(&mut *tx, &input.target_requirement_id).await?;
    if source.id == target.id {
        return Err(CoreError::Validation(
            "A requirement cannot have a relationship with itself".into(),
        )
        .into());
    }

    let relationship_type = match (input.relationship_type_id, non_blank(input.relationship_type)) {
        (Some(id), _) => RelationshipTypeRepo::find_by_id(&mut *tx, id).await?,
        (None, Some(name)) => RelationshipTypeRepo::find_by_name(&mut *tx, name.trim()).await?,
        (None, None) => {
            return Err(CoreError::Validation(
                "relationship_type_id or relationship_type is required".into(),
            )
            .into())
        }
    }
    .ok_or_else(|| CoreError::Validation("Unknown relationship type".into()))?;

    let created = RelationshipRepo::create(
        &mut *tx,
        &NewRelationship {
            source_requirement_id: source.id,
            target_requirement_id: target.id,
            relationship_type_id: relationship_type.id,
            created_by: actor.user_id,
        },
    )
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Core(CoreError::Duplicate(format!(
                "Relationship '{}' from {} to {} already exists",
                relationship_type.name, source.reference_id, target.reference_id
            )))
        }
        _ => AppError::Database(err),
    })?;

    let view = RelationshipRepo::find_view(&mut *tx, created.id)
        .await?
        .ok_or_else(|| CoreError::Internal("relationship vanished after insert".into()))?;
    tx.commit().await?;

    tracing::info!(
        relationship_id = %view.id,
        source = %view.source_reference_id,
        target = %view.target_reference_id,
        relationship_type = %view.relationship_type,
        actor_id = %actor.user_id,
        "Relationship created"
    );
    Ok(view)
}

/// Page of edges where the requirement is source or target, with the total.
pub async fn list_for_requirement(
    pool: &DbPool,
    raw: &str,
    page: Page,
) -> AppResult<(Vec<RelationshipView>, i64)> {
    let requirement = requirements::find(pool, raw).await?;
    let items = RelationshipRepo::list_for_requirement(pool, requirement.id, page).await?;
    let total = RelationshipRepo::count_for_requirement(pool, requirement.id).await?;
    Ok((items, total))
}

pub async fn delete(pool: &DbPool, actor: &AuthUser, id: DbId) -> AppResult<()> {
    if !RelationshipRepo::delete(pool, id).await? {
        return Err(CoreError::not_found("Relationship", id).into());
    }
    tracing::info!(relationship_id = %id, actor_id = %actor.user_id, "Relationship deleted");
    Ok(())
}
