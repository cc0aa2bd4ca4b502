//! User story lifecycle.
//!
//! Stories live under an epic, carry a templated description and must keep at
//! least one acceptance criterion once they leave their initial status.

use reqhub_core::entity::{validate_title, EntityType};
use reqhub_core::error::CoreError;
use reqhub_core::types::DbId;
use reqhub_core::user_story::validate_description;
use reqhub_db::models::filter::EntityFilter;
use reqhub_db::models::user_story::{NewUserStory, UpdateUserStory, UserStory};
use reqhub_db::repositories::{
    AcceptanceCriteriaRepo, ReferenceIdRepo, RequirementRepo, UserStoryRepo,
};
use reqhub_db::DbPool;
use serde::Deserialize;
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::cascade::{self, CascadeSummary};
use super::{
    comments, ensure_user_exists, epics, non_blank, parse_identifier, resolve_priority, workflow,
};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

const ENTITY: EntityType = EntityType::UserStory;

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserStoryInput {
    /// Parent epic, by UUID or reference. Supplied by the path on nested routes.
    pub epic_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i16>,
    pub status: Option<String>,
    pub assignee_id: Option<DbId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserStoryInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i16>,
    pub status: Option<String>,
}

pub(crate) async fn find<'e>(db: impl PgExecutor<'e>, raw: &str) -> AppResult<UserStory> {
    let identifier = parse_identifier(raw, ENTITY)?;
    UserStoryRepo::find(db, &identifier)
        .await?
        .ok_or_else(|| CoreError::not_found("UserStory", raw).into())
}

/// Reject leaving the initial status while the story has no acceptance criteria.
async fn ensure_criteria_for_status(
    conn: &mut PgConnection,
    story_id: DbId,
    to: &str,
) -> AppResult<()> {
    let initial = workflow::initial_status(conn, ENTITY).await?;
    if to.eq_ignore_ascii_case(&initial) {
        return Ok(());
    }
    if AcceptanceCriteriaRepo::count_for_story(&mut *conn, story_id).await? == 0 {
        return Err(CoreError::Validation(format!(
            "A user story must have at least one acceptance criteria before moving to '{to}'"
        ))
        .into());
    }
    Ok(())
}

pub async fn create(
    pool: &DbPool,
    actor: &AuthUser,
    input: CreateUserStoryInput,
) -> AppResult<UserStory> {
    let epic_ref = non_blank(input.epic_id)
        .ok_or_else(|| CoreError::Validation("epic_id is required".into()))?;
    let title = validate_title(&input.title)?;
    let description = non_blank(input.description);
    validate_description(description.as_deref())?;
    let priority = resolve_priority(input.priority)?;
    let assignee_id = input.assignee_id.unwrap_or(actor.user_id);

    let mut tx = pool.begin().await?;

    let epic = epics::find(&mut *tx, &epic_ref).await?;
    ensure_user_exists(&mut *tx, assignee_id, "assignee_id").await?;
    let status = workflow::status_for_create(&mut tx, ENTITY, input.status.as_deref()).await?;

    let id = Uuid::new_v4();
    let reference = ReferenceIdRepo::allocate(&mut tx, ENTITY, id).await?;

    let story = UserStoryRepo::insert(
        &mut *tx,
        &NewUserStory {
            id,
            reference_id: reference.reference_id,
            sequence_number: reference.sequence_number,
            epic_id: epic.id,
            title,
            description,
            priority,
            status,
            creator_id: actor.user_id,
            assignee_id: Some(assignee_id),
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        user_story_id = %story.id,
        reference_id = %story.reference_id,
        epic_id = %epic.id,
        actor_id = %actor.user_id,
        "User story created"
    );
    Ok(story)
}

pub async fn get(pool: &DbPool, raw: &str) -> AppResult<UserStory> {
    find(pool, raw).await
}

/// Stories across all epics, or only under `epic` when given.
pub async fn list(
    pool: &DbPool,
    epic: Option<&str>,
    filter: &EntityFilter,
) -> AppResult<(Vec<UserStory>, i64)> {
    let epic_id = match epic {
        Some(raw) => Some(epics::find(pool, raw).await?.id),
        None => None,
    };
    let items = UserStoryRepo::list(pool, epic_id, filter).await?;
    let total = UserStoryRepo::count(pool, epic_id, filter).await?;
    Ok((items, total))
}

pub async fn update(
    pool: &DbPool,
    actor: &AuthUser,
    raw: &str,
    input: UpdateUserStoryInput,
) -> AppResult<UserStory> {
    let title = input.title.as_deref().map(validate_title).transpose()?;
    validate_description(input.description.as_deref())?;
    let priority = input.priority.map(|p| resolve_priority(Some(p))).transpose()?;

    let mut tx = pool.begin().await?;
    let current = find(&mut *tx, raw).await?;

    let status = match non_blank(input.status) {
        Some(to) => {
            let to = workflow::check_transition(&mut tx, ENTITY, &current.status, &to).await?;
            ensure_criteria_for_status(&mut tx, current.id, &to).await?;
            Some(to)
        }
        None => None,
    };

    let description_changed = input
        .description
        .as_ref()
        .is_some_and(|d| current.description.as_ref() != Some(d));

    let mut story = UserStoryRepo::update(
        &mut *tx,
        current.id,
        &UpdateUserStory {
            title,
            description: input.description,
            priority,
        },
    )
    .await?
    .ok_or_else(|| CoreError::not_found("UserStory", raw))?;

    if let Some(status) = status.filter(|s| *s != story.status) {
        story = UserStoryRepo::set_status(&mut *tx, story.id, &status)
            .await?
            .ok_or_else(|| CoreError::not_found("UserStory", raw))?;
    }

    if description_changed {
        let description = story.description.clone().unwrap_or_default();
        comments::revalidate_anchors(&mut tx, ENTITY, story.id, &description).await?;
    }

    tx.commit().await?;

    tracing::info!(user_story_id = %story.id, actor_id = %actor.user_id, "User story updated");
    Ok(story)
}

pub async fn change_status(
    pool: &DbPool,
    actor: &AuthUser,
    raw: &str,
    status: &str,
) -> AppResult<UserStory> {
    let mut tx = pool.begin().await?;
    let current = find(&mut *tx, raw).await?;
    let to = workflow::check_transition(&mut tx, ENTITY, &current.status, status).await?;
    ensure_criteria_for_status(&mut tx, current.id, &to).await?;

    let story = UserStoryRepo::set_status(&mut *tx, current.id, &to)
        .await?
        .ok_or_else(|| CoreError::not_found("UserStory", raw))?;
    tx.commit().await?;

    tracing::info!(
        user_story_id = %story.id,
        actor_id = %actor.user_id,
        from = %current.status,
        to = %story.status,
        "User story status changed"
    );
    Ok(story)
}

pub async fn assign(
    pool: &DbPool,
    actor: &AuthUser,
    raw: &str,
    assignee_id: Option<DbId>,
) -> AppResult<UserStory> {
    let current = find(pool, raw).await?;
    if let Some(assignee_id) = assignee_id {
        ensure_user_exists(pool, assignee_id, "assignee_id").await?;
    }

    let story = UserStoryRepo::set_assignee(pool, current.id, assignee_id)
        .await?
        .ok_or_else(|| CoreError::not_found("UserStory", raw))?;

    tracing::info!(
        user_story_id = %story.id,
        actor_id = %actor.user_id,
        assignee_id = ?assignee_id,
        "User story assigned"
    );
    Ok(story)
}

/// Delete a story. Refused while it owns requirements unless `force`;
/// acceptance criteria always go with the story.
pub async fn delete(pool: &DbPool, actor: &AuthUser, raw: &str, force: bool) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    let story = find(&mut *tx, raw).await?;

    let requirements = RequirementRepo::count_for_story(&mut *tx, story.id).await?;
    if requirements > 0 && !force {
        return Err(CoreError::InUse(format!(
            "User story {} has {requirements} requirements; delete them first or use force=true",
            story.reference_id
        ))
        .into());
    }

    let mut summary = CascadeSummary::default();
    cascade::purge_story(&mut tx, story.id, &mut summary).await?;
    UserStoryRepo::delete(&mut *tx, story.id).await?;
    tx.commit().await?;

    tracing::info!(
        user_story_id = %story.id,
        reference_id = %story.reference_id,
        actor_id = %actor.user_id,
        force,
        acceptance_criteria = summary.acceptance_criteria,
        requirements = summary.requirements,
        relationships = summary.relationships,
        "User story deleted"
    );
    Ok(())
}
