//! Epic lifecycle: create, read, list, update, status, assignment, delete.

use reqhub_core::entity::{validate_description, validate_title, EntityType};
use reqhub_core::error::CoreError;
use reqhub_core::types::DbId;
use reqhub_db::models::epic::{Epic, NewEpic, UpdateEpic};
use reqhub_db::models::filter::EntityFilter;
use reqhub_db::repositories::{EpicRepo, ReferenceIdRepo, UserStoryRepo};
use reqhub_db::DbPool;
use serde::Deserialize;
use sqlx::PgExecutor;
use uuid::Uuid;

use super::cascade::{self, CascadeSummary};
use super::{comments, ensure_user_exists, non_blank, parse_identifier, resolve_priority, workflow};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

const ENTITY: EntityType = EntityType::Epic;

#[derive(Debug, Default, Deserialize)]
pub struct CreateEpicInput {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i16>,
    /// Must be the initial status when given.
    pub status: Option<String>,
    /// Defaults to the creator.
    pub assignee_id: Option<DbId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEpicInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i16>,
    pub status: Option<String>,
}

pub(crate) async fn find<'e>(db: impl PgExecutor<'e>, raw: &str) -> AppResult<Epic> {
    let identifier = parse_identifier(raw, ENTITY)?;
    EpicRepo::find(db, &identifier)
        .await?
        .ok_or_else(|| CoreError::not_found("Epic", raw).into())
}

pub async fn create(pool: &DbPool, actor: &AuthUser, input: CreateEpicInput) -> AppResult<Epic> {
    let title = validate_title(&input.title)?;
    let description = non_blank(input.description);
    validate_description(description.as_deref())?;
    let priority = resolve_priority(input.priority)?;
    let assignee_id = input.assignee_id.unwrap_or(actor.user_id);

    let mut tx = pool.begin().await?;

    ensure_user_exists(&mut *tx, assignee_id, "assignee_id").await?;
    let status = workflow::status_for_create(&mut tx, ENTITY, input.status.as_deref()).await?;

    let id = Uuid::new_v4();
    let reference = ReferenceIdRepo::allocate(&mut tx, ENTITY, id).await?;

    let epic = EpicRepo::insert(
        &mut *tx,
        &NewEpic {
            id,
            reference_id: reference.reference_id,
            sequence_number: reference.sequence_number,
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
        epic_id = %epic.id,
        reference_id = %epic.reference_id,
        actor_id = %actor.user_id,
        "Epic created"
    );
    Ok(epic)
}

pub async fn get(pool: &DbPool, raw: &str) -> AppResult<Epic> {
    find(pool, raw).await
}

pub async fn list(pool: &DbPool, filter: &EntityFilter) -> AppResult<(Vec<Epic>, i64)> {
    let items = EpicRepo::list(pool, filter).await?;
    let total = EpicRepo::count(pool, filter).await?;
    Ok((items, total))
}

/// Partial update. A description change re-anchors inline comments and a
/// status change is checked against the workflow, both in the same transaction.
pub async fn update(
    pool: &DbPool,
    actor: &AuthUser,
    raw: &str,
    input: UpdateEpicInput,
) -> AppResult<Epic> {
    let title = input.title.as_deref().map(validate_title).transpose()?;
    validate_description(input.description.as_deref())?;
    let priority = input.priority.map(|p| resolve_priority(Some(p))).transpose()?;

    let mut tx = pool.begin().await?;
    let current = find(&mut *tx, raw).await?;

    let status = match non_blank(input.status) {
        Some(to) => Some(workflow::check_transition(&mut tx, ENTITY, &current.status, &to).await?),
        None => None,
    };

    let description_changed = input
        .description
        .as_ref()
        .is_some_and(|d| current.description.as_ref() != Some(d));

    let mut epic = EpicRepo::update(
        &mut *tx,
        current.id,
        &UpdateEpic {
            title,
            description: input.description,
            priority,
        },
    )
    .await?
    .ok_or_else(|| CoreError::not_found("Epic", raw))?;

    if let Some(status) = status.filter(|s| *s != epic.status) {
        epic = EpicRepo::set_status(&mut *tx, epic.id, &status)
            .await?
            .ok_or_else(|| CoreError::not_found("Epic", raw))?;
    }

    if description_changed {
        let description = epic.description.clone().unwrap_or_default();
        comments::revalidate_anchors(&mut tx, ENTITY, epic.id, &description).await?;
    }

    tx.commit().await?;

    tracing::info!(epic_id = %epic.id, actor_id = %actor.user_id, "Epic updated");
    Ok(epic)
}

pub async fn change_status(
    pool: &DbPool,
    actor: &AuthUser,
    raw: &str,
    status: &str,
) -> AppResult<Epic> {
    let mut tx = pool.begin().await?;
    let current = find(&mut *tx, raw).await?;
    let to = workflow::check_transition(&mut tx, ENTITY, &current.status, status).await?;

    let epic = EpicRepo::set_status(&mut *tx, current.id, &to)
        .await?
        .ok_or_else(|| CoreError::not_found("Epic", raw))?;
    tx.commit().await?;

    tracing::info!(
        epic_id = %epic.id,
        actor_id = %actor.user_id,
        from = %current.status,
        to = %epic.status,
        "Epic status changed"
    );
    Ok(epic)
}

/// Set the assignee; `None` unassigns.
pub async fn assign(
    pool: &DbPool,
    actor: &AuthUser,
    raw: &str,
    assignee_id: Option<DbId>,
) -> AppResult<Epic> {
    let current = find(pool, raw).await?;
    if let Some(assignee_id) = assignee_id {
        ensure_user_exists(pool, assignee_id, "assignee_id").await?;
    }

    let epic = EpicRepo::set_assignee(pool, current.id, assignee_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Epic", raw))?;

    tracing::info!(epic_id = %epic.id, actor_id = %actor.user_id, assignee_id = ?assignee_id, "Epic assigned");
    Ok(epic)
}

/// Delete an epic. Refused while it owns user stories unless `force`, which
/// removes the whole subtree.
pub async fn delete(pool: &DbPool, actor: &AuthUser, raw: &str, force: bool) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    let epic = find(&mut *tx, raw).await?;

    let stories = UserStoryRepo::count_for_epic(&mut *tx, epic.id).await?;
    if stories > 0 && !force {
        return Err(CoreError::InUse(format!(
            "Epic {} has {stories} user stories; delete them first or use force=true",
            epic.reference_id
        ))
        .into());
    }

    let mut summary = CascadeSummary::default();
    cascade::purge_epic(&mut tx, epic.id, &mut summary).await?;
    EpicRepo::delete(&mut *tx, epic.id).await?;
    tx.commit().await?;

    tracing::info!(
        epic_id = %epic.id,
        reference_id = %epic.reference_id,
        actor_id = %actor.user_id,
        force,
        user_stories = summary.user_stories,
        requirements = summary.requirements,
        comments = summary.comments,
        "Epic deleted"
    );
    Ok(())
}
