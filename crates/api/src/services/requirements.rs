//! Requirement lifecycle.
//!
//! A requirement lives under a user story, optionally points at one of that
//! story's acceptance criteria and always carries a requirement type.

use reqhub_core::entity::{validate_description, validate_title, EntityType};
use reqhub_core::error::CoreError;
use reqhub_core::types::DbId;
use reqhub_db::models::filter::EntityFilter;
use reqhub_db::models::lookup::RequirementType;
use reqhub_db::models::requirement::{NewRequirement, Requirement, UpdateRequirement};
use reqhub_db::repositories::requirement_type_repo::DEFAULT_REQUIREMENT_TYPE;
use reqhub_db::repositories::{
    ReferenceIdRepo, RelationshipRepo, RequirementRepo, RequirementTypeRepo,
};
use reqhub_db::DbPool;
use serde::Deserialize;
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::cascade::{self, CascadeSummary};
use super::{
    acceptance_criteria, comments, ensure_user_exists, non_blank, parse_identifier,
    resolve_priority, user_stories, workflow,
};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

const ENTITY: EntityType = EntityType::Requirement;

#[derive(Debug, Default, Deserialize)]
pub struct CreateRequirementInput {
    /// Parent story, by UUID or reference. Supplied by the path on nested routes.
    pub user_story_id: Option<String>,
    pub acceptance_criteria_id: Option<DbId>,
    pub requirement_type_id: Option<DbId>,
    /// Type by name, used when no id is given. Defaults to `Functional`.
    pub requirement_type: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i16>,
    pub status: Option<String>,
    pub assignee_id: Option<DbId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequirementInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i16>,
    pub status: Option<String>,
    pub requirement_type_id: Option<DbId>,
    /// `null` detaches the requirement from its acceptance criteria.
    #[serde(default, deserialize_with = "double_option")]
    pub acceptance_criteria_id: Option<Option<DbId>>,
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<DbId>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<DbId>::deserialize(deserializer).map(Some)
}

pub(crate) async fn find<'e>(db: impl PgExecutor<'e>, raw: &str) -> AppResult<Requirement> {
    let identifier = parse_identifier(raw, ENTITY)?;
    RequirementRepo::find(db, &identifier)
        .await?
        .ok_or_else(|| CoreError::not_found("Requirement", raw).into())
}

async fn resolve_type(
    conn: &mut PgConnection,
    id: Option<DbId>,
    name: Option<String>,
) -> AppResult<RequirementType> {
    let found = match (id, non_blank(name)) {
        (Some(id), _) => RequirementTypeRepo::find_by_id(&mut *conn, id).await?,
        (None, Some(name)) => RequirementTypeRepo::find_by_name(&mut *conn, name.trim()).await?,
        (None, None) => {
            return RequirementTypeRepo::find_by_name(&mut *conn, DEFAULT_REQUIREMENT_TYPE)
                .await?
                .ok_or_else(|| {
                    CoreError::Internal(format!(
                        "default requirement type '{DEFAULT_REQUIREMENT_TYPE}' is not configured"
                    ))
                    .into()
                });
        }
    };
    found.ok_or_else(|| CoreError::Validation("Unknown requirement type".into()).into())
}

pub async fn create(
    pool: &DbPool,
    actor: &AuthUser,
    input: CreateRequirementInput,
) -> AppResult<Requirement> {
    let story_ref = non_blank(input.user_story_id)
        .ok_or_else(|| CoreError::Validation("user_story_id is required".into()))?;
    let title = validate_title(&input.title)?;
    let description = non_blank(input.description);
    validate_description(description.as_deref())?;
    let priority = resolve_priority(input.priority)?;
    let assignee_id = input.assignee_id.unwrap_or(actor.user_id);

    let mut tx = pool.begin().await?;

    let story = user_stories::find(&mut *tx, &story_ref).await?;
    if let Some(criteria_id) = input.acceptance_criteria_id {
        acceptance_criteria::ensure_belongs_to_story(&mut *tx, criteria_id, story.id).await?;
    }
    let requirement_type =
        resolve_type(&mut tx, input.requirement_type_id, input.requirement_type).await?;
    ensure_user_exists(&mut *tx, assignee_id, "assignee_id").await?;
    let status = workflow::status_for_create(&mut tx, ENTITY, input.status.as_deref()).await?;

    let id = Uuid::new_v4();
    let reference = ReferenceIdRepo::allocate(&mut tx, ENTITY, id).await?;

    let requirement = RequirementRepo::insert(
        &mut *tx,
        &NewRequirement {
            id,
            reference_id: reference.reference_id,
            sequence_number: reference.sequence_number,
            user_story_id: story.id,
            acceptance_criteria_id: input.acceptance_criteria_id,
            requirement_type_id: requirement_type.id,
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
        requirement_id = %requirement.id,
        reference_id = %requirement.reference_id,
        user_story_id = %story.id,
        requirement_type = %requirement_type.name,
        actor_id = %actor.user_id,
        "Requirement created"
    );
    Ok(requirement)
}

pub async fn get(pool: &DbPool, raw: &str) -> AppResult<Requirement> {
    find(pool, raw).await
}

/// Requirements across all stories, or only under `story` when given.
pub async fn list(
    pool: &DbPool,
    story: Option<&str>,
    filter: &EntityFilter,
) -> AppResult<(Vec<Requirement>, i64)> {
    let story_id = match story {
        Some(raw) => Some(user_stories::find(pool, raw).await?.id),
        None => None,
    };
    let items = RequirementRepo::list(pool, story_id, filter).await?;
    let total = RequirementRepo::count(pool, story_id, filter).await?;
    Ok((items, total))
}

pub async fn update(
    pool: &DbPool,
    actor: &AuthUser,
    raw: &str,
    input: UpdateRequirementInput,
) -> AppResult<Requirement> {
    let title = input.title.as_deref().map(validate_title).transpose()?;
    validate_description(input.description.as_deref())?;
    let priority = input.priority.map(|p| resolve_priority(Some(p))).transpose()?;

    let mut tx = pool.begin().await?;
    let current = find(&mut *tx, raw).await?;

    if let Some(Some(criteria_id)) = input.acceptance_criteria_id {
        acceptance_criteria::ensure_belongs_to_story(&mut *tx, criteria_id, current.user_story_id)
            .await?;
    }
    if let Some(type_id) = input.requirement_type_id {
        resolve_type(&mut tx, Some(type_id), None).await?;
    }

    let status = match non_blank(input.status) {
        Some(to) => Some(workflow::check_transition(&mut tx, ENTITY, &current.status, &to).await?),
        None => None,
    };

    let description_changed = input
        .description
        .as_ref()
        .is_some_and(|d| current.description.as_ref() != Some(d));

    let mut requirement = RequirementRepo::update(
        &mut *tx,
        current.id,
        &UpdateRequirement {
            title,
            description: input.description,
            priority,
            requirement_type_id: input.requirement_type_id,
            acceptance_criteria_id: input.acceptance_criteria_id,
        },
    )
    .await?
    .ok_or_else(|| CoreError::not_found("Requirement", raw))?;

    if let Some(status) = status.filter(|s| *s != requirement.status) {
        requirement = RequirementRepo::set_status(&mut *tx, requirement.id, &status)
            .await?
            .ok_or_else(|| CoreError::not_found("Requirement", raw))?;
    }

    if description_changed {
        let description = requirement.description.clone().unwrap_or_default();
        comments::revalidate_anchors(&mut tx, ENTITY, requirement.id, &description).await?;
    }

    tx.commit().await?;

    tracing::info!(requirement_id = %requirement.id, actor_id = %actor.user_id, "Requirement updated");
    Ok(requirement)
}

pub async fn change_status(
    pool: &DbPool,
    actor: &AuthUser,
    raw: &str,
    status: &str,
) -> AppResult<Requirement> {
    let mut tx = pool.begin().await?;
    let current = find(&mut *tx, raw).await?;
    let to = workflow::check_transition(&mut tx, ENTITY, &current.status, status).await?;

    let requirement = RequirementRepo::set_status(&mut *tx, current.id, &to)
        .await?
        .ok_or_else(|| CoreError::not_found("Requirement", raw))?;
    tx.commit().await?;

    tracing::info!(
        requirement_id = %requirement.id,
        actor_id = %actor.user_id,
        from = %current.status,
        to = %requirement.status,
        "Requirement status changed"
    );
    Ok(requirement)
}

pub async fn assign(
    pool: &DbPool,
    actor: &AuthUser,
    raw: &str,
    assignee_id: Option<DbId>,
) -> AppResult<Requirement> {
    let current = find(pool, raw).await?;
    if let Some(assignee_id) = assignee_id {
        ensure_user_exists(pool, assignee_id, "assignee_id").await?;
    }

    let requirement = RequirementRepo::set_assignee(pool, current.id, assignee_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Requirement", raw))?;

    tracing::info!(
        requirement_id = %requirement.id,
        actor_id = %actor.user_id,
        assignee_id = ?assignee_id,
        "Requirement assigned"
    );
    Ok(requirement)
}

/// Delete a requirement. Refused while relationships reference it unless
/// `force`, which removes those relationships first.
pub async fn delete(pool: &DbPool, actor: &AuthUser, raw: &str, force: bool) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    let requirement = find(&mut *tx, raw).await?;

    let relationships = RelationshipRepo::count_for_requirement(&mut *tx, requirement.id).await?;
    if relationships > 0 && !force {
        return Err(CoreError::InUse(format!(
            "Requirement {} is part of {relationships} relationships; use force=true to remove them",
            requirement.reference_id
        ))
        .into());
    }

    let mut summary = CascadeSummary::default();
    cascade::purge_requirements(&mut tx, &[requirement.id], &mut summary).await?;
    RequirementRepo::delete(&mut *tx, requirement.id).await?;
    tx.commit().await?;

    tracing::info!(
        requirement_id = %requirement.id,
        reference_id = %requirement.reference_id,
        actor_id = %actor.user_id,
        force,
        relationships = summary.relationships,
        comments = summary.comments,
        "Requirement deleted"
    );
    Ok(())
}
