//! Acceptance criteria: free-form conditions owned by a user story.

use reqhub_core::entity::{validate_description, EntityType};
use reqhub_core::error::CoreError;
use reqhub_core::pagination::Page;
use reqhub_core::types::DbId;
use reqhub_db::models::acceptance_criteria::{AcceptanceCriteria, NewAcceptanceCriteria};
use reqhub_db::repositories::{
    AcceptanceCriteriaRepo, CommentRepo, ReferenceIdRepo, RequirementRepo,
};
use reqhub_db::DbPool;
use serde::Deserialize;
use sqlx::PgExecutor;
use uuid::Uuid;

use super::{comments, parse_identifier, user_stories};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

const ENTITY: EntityType = EntityType::AcceptanceCriteria;

#[derive(Debug, Default, Deserialize)]
pub struct CreateAcceptanceCriteriaInput {
    /// Parent story, by UUID or reference. Supplied by the path on nested routes.
    pub user_story_id: Option<String>,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAcceptanceCriteriaInput {
    pub description: String,
}

fn validate_criteria_text(description: &str) -> AppResult<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("description must not be empty".into()).into());
    }
    validate_description(Some(trimmed))?;
    Ok(trimmed.to_string())
}

pub(crate) async fn find<'e>(
    db: impl PgExecutor<'e>,
    raw: &str,
) -> AppResult<AcceptanceCriteria> {
    let identifier = parse_identifier(raw, ENTITY)?;
    AcceptanceCriteriaRepo::find(db, &identifier)
        .await?
        .ok_or_else(|| CoreError::not_found("AcceptanceCriteria", raw).into())
}

/// Create a criterion under a story. The actor becomes its author.
pub async fn create(
    pool: &DbPool,
    actor: &AuthUser,
    input: CreateAcceptanceCriteriaInput,
) -> AppResult<AcceptanceCriteria> {
    let story_ref = super::non_blank(input.user_story_id)
        .ok_or_else(|| CoreError::Validation("user_story_id is required".into()))?;
    let description = validate_criteria_text(&input.description)?;

    let mut tx = pool.begin().await?;
    let story = user_stories::find(&mut *tx, &story_ref).await?;

    let id = Uuid::new_v4();
    let reference = ReferenceIdRepo::allocate(&mut tx, ENTITY, id).await?;

    let criteria = AcceptanceCriteriaRepo::insert(
        &mut *tx,
        &NewAcceptanceCriteria {
            id,
            reference_id: reference.reference_id,
            sequence_number: reference.sequence_number,
            user_story_id: story.id,
            description,
            author_id: actor.user_id,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        acceptance_criteria_id = %criteria.id,
        reference_id = %criteria.reference_id,
        user_story_id = %story.id,
        actor_id = %actor.user_id,
        "Acceptance criteria created"
    );
    Ok(criteria)
}

pub async fn get(pool: &DbPool, raw: &str) -> AppResult<AcceptanceCriteria> {
    find(pool, raw).await
}

pub async fn list_for_story(
    pool: &DbPool,
    story: &str,
    page: Page,
) -> AppResult<(Vec<AcceptanceCriteria>, i64)> {
    let story = user_stories::find(pool, story).await?;
    let items = AcceptanceCriteriaRepo::list_for_story(pool, story.id, page).await?;
    let total = AcceptanceCriteriaRepo::count_for_story(pool, story.id).await?;
    Ok((items, total))
}

/// Replace the description and re-anchor inline comments on it.
pub async fn update(
    pool: &DbPool,
    actor: &AuthUser,
    raw: &str,
    input: UpdateAcceptanceCriteriaInput,
) -> AppResult<AcceptanceCriteria> {
    let description = validate_criteria_text(&input.description)?;

    let mut tx = pool.begin().await?;
    let current = find(&mut *tx, raw).await?;
    if current.description == description {
        return Ok(current);
    }

    let criteria = AcceptanceCriteriaRepo::update_description(&mut *tx, current.id, &description)
        .await?
        .ok_or_else(|| CoreError::not_found("AcceptanceCriteria", raw))?;
    comments::revalidate_anchors(&mut tx, ENTITY, criteria.id, &criteria.description).await?;
    tx.commit().await?;

    tracing::info!(
        acceptance_criteria_id = %criteria.id,
        actor_id = %actor.user_id,
        "Acceptance criteria updated"
    );
    Ok(criteria)
}

/// Delete a criterion.
///
/// Without `force` this is refused while requirements point at it or when it
/// is the story's last criterion. With `force` those requirements lose their
/// back-reference and stay in place.
pub async fn delete(pool: &DbPool, actor: &AuthUser, raw: &str, force: bool) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    let criteria = find(&mut *tx, raw).await?;

    if !force {
        let linked = RequirementRepo::count_for_acceptance_criteria(&mut *tx, criteria.id).await?;
        if linked > 0 {
            return Err(CoreError::InUse(format!(
                "Acceptance criteria {} is referenced by {linked} requirements; use force=true to detach them",
                criteria.reference_id
            ))
            .into());
        }
        let siblings = AcceptanceCriteriaRepo::count_for_story(&mut *tx, criteria.user_story_id).await?;
        if siblings <= 1 {
            return Err(CoreError::LastAcceptanceCriteria(
                "A user story must have at least one acceptance criteria".into(),
            )
            .into());
        }
    }

    let detached = RequirementRepo::clear_acceptance_criteria(&mut *tx, criteria.id).await?;
    let comments_removed =
        CommentRepo::delete_for_entities(&mut *tx, ENTITY.as_str(), &[criteria.id]).await?;
    AcceptanceCriteriaRepo::delete(&mut *tx, criteria.id).await?;
    tx.commit().await?;

    tracing::info!(
        acceptance_criteria_id = %criteria.id,
        reference_id = %criteria.reference_id,
        actor_id = %actor.user_id,
        force,
        detached_requirements = detached,
        comments = comments_removed,
        "Acceptance criteria deleted"
    );
    Ok(())
}

/// Ensure `criteria_id` exists and belongs to `story_id`.
pub(crate) async fn ensure_belongs_to_story<'e>(
    db: impl PgExecutor<'e>,
    criteria_id: DbId,
    story_id: DbId,
) -> AppResult<()> {
    let criteria = AcceptanceCriteriaRepo::find_by_id(db, criteria_id)
        .await?
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "acceptance_criteria_id {criteria_id} does not refer to an existing acceptance criteria"
            ))
        })?;
    if criteria.user_story_id != story_id {
        return Err(CoreError::Validation(format!(
            "Acceptance criteria {} belongs to a different user story",
            criteria.reference_id
        ))
        .into());
    }
    Ok(())
}
