//! Status model administration: models, their statuses and transitions.
//!
//! Only the default model of an entity type drives the workflow. Edits that
//! would strand existing entities in an unknown status are refused while the
//! model is the default.

use reqhub_core::entity::EntityType;
use reqhub_core::error::CoreError;
use reqhub_core::types::DbId;
use reqhub_core::workflow::{validate_status_name, validate_status_set, StatusDef};
use reqhub_db::models::status_model::{
    CreateStatus, CreateStatusModel, Status, StatusModel, StatusModelDetail, StatusTransition,
    UpdateStatus, UpdateStatusModel,
};
use reqhub_db::repositories::StatusModelRepo;
use reqhub_db::DbPool;
use serde::Deserialize;
use sqlx::PgConnection;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateStatusModelInput {
    pub entity_type: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusModelInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStatusInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub is_initial: bool,
    #[serde(default)]
    pub is_final: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_initial: Option<bool>,
    pub is_final: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTransitionInput {
    pub from_status_id: DbId,
    pub to_status_id: DbId,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse an entity type that has a workflow.
pub fn parse_workflow_entity(raw: &str) -> AppResult<EntityType> {
    let entity = EntityType::parse(raw)
        .ok_or_else(|| CoreError::Validation(format!("Unknown entity type '{raw}'")))?;
    if !entity.has_workflow() {
        return Err(CoreError::Validation(format!(
            "{} has no status workflow",
            entity.display_name()
        ))
        .into());
    }
    Ok(entity)
}

fn model_entity(model: &StatusModel) -> AppResult<EntityType> {
    EntityType::parse(&model.entity_type).ok_or_else(|| {
        CoreError::Internal(format!(
            "status model {} has unknown entity type '{}'",
            model.id, model.entity_type
        ))
        .into()
    })
}

async fn load(conn: &mut PgConnection, id: DbId) -> AppResult<StatusModelDetail> {
    StatusModelRepo::load_detail(conn, id)
        .await?
        .ok_or_else(|| CoreError::not_found("StatusModel", id).into())
}

async fn find_status(conn: &mut PgConnection, model_id: DbId, status_id: DbId) -> AppResult<Status> {
    StatusModelRepo::find_status(conn, model_id, status_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Status", status_id).into())
}

/// Re-check the whole status set after a write, inside the same transaction.
async fn check_status_set(conn: &mut PgConnection, model_id: DbId) -> AppResult<()> {
    let defs: Vec<StatusDef> = StatusModelRepo::list_statuses(conn, model_id)
        .await?
        .into_iter()
        .map(|s| StatusDef {
            name: s.name,
            is_initial: s.is_initial,
            is_final: s.is_final,
            sort_order: s.sort_order,
        })
        .collect();
    Ok(validate_status_set(&defs)?)
}

/// Refuse to rename or remove a status that entities of the default model use.
async fn ensure_status_unused(
    conn: &mut PgConnection,
    model: &StatusModel,
    status: &Status,
) -> AppResult<()> {
    if !model.is_default {
        return Ok(());
    }
    let entity = model_entity(model)?;
    let usage = StatusModelRepo::status_usage(conn, entity, &status.name).await?;
    if usage > 0 {
        return Err(CoreError::InUse(format!(
            "Status '{}' is used by {usage} {} records",
            status.name,
            entity.display_name()
        ))
        .into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

pub async fn list(pool: &DbPool, entity_type: Option<&str>) -> AppResult<Vec<StatusModel>> {
    let entity = entity_type.map(parse_workflow_entity).transpose()?;
    Ok(StatusModelRepo::list(pool, entity).await?)
}

pub async fn get(pool: &DbPool, id: DbId) -> AppResult<StatusModelDetail> {
    let mut conn = pool.acquire().await?;
    load(&mut conn, id).await
}

/// The default model of an entity type, with statuses and transitions.
pub async fn get_default(pool: &DbPool, entity_type: &str) -> AppResult<StatusModelDetail> {
    let entity = parse_workflow_entity(entity_type)?;
    let mut conn = pool.acquire().await?;
    let model = StatusModelRepo::find_default(&mut *conn, entity)
        .await?
        .ok_or_else(|| CoreError::not_found("StatusModel", entity))?;
    load(&mut conn, model.id).await
}

pub async fn create(
    pool: &DbPool,
    actor: &AuthUser,
    input: CreateStatusModelInput,
) -> AppResult<StatusModelDetail> {
    let entity = parse_workflow_entity(&input.entity_type)?;
    let name = validate_status_name(&input.name)?;
    if input.is_default {
        return Err(CoreError::Validation(
            "Add statuses to the model, then make it the default".into(),
        )
        .into());
    }

    let mut tx = pool.begin().await?;
    let model = StatusModelRepo::create(
        &mut tx,
        &CreateStatusModel {
            entity_type: entity.as_str().to_string(),
            name,
            description: input.description,
            is_default: false,
        },
    )
    .await?;
    let detail = load(&mut tx, model.id).await?;
    tx.commit().await?;

    tracing::info!(
        status_model_id = %model.id,
        entity_type = %entity,
        is_default = model.is_default,
        actor_id = %actor.user_id,
        "Status model created"
    );
    Ok(detail)
}

pub async fn update(
    pool: &DbPool,
    actor: &AuthUser,
    id: DbId,
    input: UpdateStatusModelInput,
) -> AppResult<StatusModel> {
    let name = input.name.as_deref().map(validate_status_name).transpose()?;
    let model = StatusModelRepo::update(
        pool,
        id,
        &UpdateStatusModel {
            name,
            description: input.description,
        },
    )
    .await?
    .ok_or_else(|| CoreError::not_found("StatusModel", id))?;

    tracing::info!(status_model_id = %id, actor_id = %actor.user_id, "Status model updated");
    Ok(model)
}

/// Make a model the default of its entity type. Every entity of that type
/// must already be in one of the model's statuses.
pub async fn set_default(pool: &DbPool, actor: &AuthUser, id: DbId) -> AppResult<StatusModel> {
    let mut tx = pool.begin().await?;
    let detail = load(&mut tx, id).await?;
    if detail.statuses.is_empty() {
        return Err(CoreError::Validation(
            "A status model needs at least one status before it can become the default".into(),
        )
        .into());
    }

    let entity = model_entity(&detail.model)?;
    let names: Vec<String> = detail.statuses.iter().map(|s| s.name.clone()).collect();
    let stranded = StatusModelRepo::count_outside_statuses(&mut *tx, entity, &names).await?;
    if stranded > 0 {
        return Err(CoreError::InUse(format!(
            "{stranded} {} records are in statuses that '{}' does not define",
            entity.display_name(),
            detail.model.name
        ))
        .into());
    }

    let model = StatusModelRepo::set_default(&mut tx, id)
        .await?
        .ok_or_else(|| CoreError::not_found("StatusModel", id))?;
    tx.commit().await?;

    tracing::info!(
        status_model_id = %id,
        entity_type = %model.entity_type,
        actor_id = %actor.user_id,
        "Default status model changed"
    );
    Ok(model)
}

pub async fn delete(pool: &DbPool, actor: &AuthUser, id: DbId) -> AppResult<()> {
    let model = StatusModelRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("StatusModel", id))?;
    if model.is_default {
        return Err(CoreError::InUse(format!(
            "Status model '{}' is the default for {} and cannot be deleted",
            model.name, model.entity_type
        ))
        .into());
    }
    StatusModelRepo::delete(pool, id).await?;

    tracing::info!(status_model_id = %id, actor_id = %actor.user_id, "Status model deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

/// Add a status. The first status of a model is always its initial one.
pub async fn add_status(
    pool: &DbPool,
    actor: &AuthUser,
    model_id: DbId,
    input: CreateStatusInput,
) -> AppResult<Status> {
    let name = validate_status_name(&input.name)?;

    let mut tx = pool.begin().await?;
    let detail = load(&mut tx, model_id).await?;
    let is_initial = input.is_initial || detail.statuses.is_empty();

    let status = StatusModelRepo::create_status(
        &mut tx,
        model_id,
        &CreateStatus {
            name,
            description: input.description,
            sort_order: input.sort_order,
            is_initial,
            is_final: input.is_final,
        },
    )
    .await?;
    check_status_set(&mut tx, model_id).await?;
    tx.commit().await?;

    tracing::info!(
        status_model_id = %model_id,
        status = %status.name,
        actor_id = %actor.user_id,
        "Status added"
    );
    Ok(status)
}

pub async fn update_status(
    pool: &DbPool,
    actor: &AuthUser,
    model_id: DbId,
    status_id: DbId,
    input: UpdateStatusInput,
) -> AppResult<Status> {
    let name = input.name.as_deref().map(validate_status_name).transpose()?;

    let mut tx = pool.begin().await?;
    let detail = load(&mut tx, model_id).await?;
    let current = find_status(&mut tx, model_id, status_id).await?;

    if current.is_initial && input.is_initial == Some(false) {
        return Err(CoreError::Validation(
            "Mark another status as initial instead of clearing the initial flag".into(),
        )
        .into());
    }
    if name.as_ref().is_some_and(|n| *n != current.name) {
        ensure_status_unused(&mut tx, &detail.model, &current).await?;
    }

    let status = StatusModelRepo::update_status(
        &mut tx,
        model_id,
        status_id,
        &UpdateStatus {
            name,
            description: input.description,
            sort_order: input.sort_order,
            is_initial: input.is_initial,
            is_final: input.is_final,
        },
    )
    .await?
    .ok_or_else(|| CoreError::not_found("Status", status_id))?;
    check_status_set(&mut tx, model_id).await?;
    tx.commit().await?;

    tracing::info!(
        status_model_id = %model_id,
        status_id = %status_id,
        actor_id = %actor.user_id,
        "Status updated"
    );
    Ok(status)
}

pub async fn delete_status(
    pool: &DbPool,
    actor: &AuthUser,
    model_id: DbId,
    status_id: DbId,
) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    let detail = load(&mut tx, model_id).await?;
    let status = find_status(&mut tx, model_id, status_id).await?;

    if status.is_initial && detail.statuses.len() > 1 {
        return Err(CoreError::Validation(format!(
            "'{}' is the initial status; mark another status as initial first",
            status.name
        ))
        .into());
    }
    ensure_status_unused(&mut tx, &detail.model, &status).await?;

    StatusModelRepo::delete_status(&mut *tx, model_id, status_id).await?;
    tx.commit().await?;

    tracing::info!(
        status_model_id = %model_id,
        status = %status.name,
        actor_id = %actor.user_id,
        "Status deleted"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Add an allowed transition. Once a model has any transition, only listed
/// transitions are permitted.
pub async fn add_transition(
    pool: &DbPool,
    actor: &AuthUser,
    model_id: DbId,
    input: CreateTransitionInput,
) -> AppResult<StatusTransition> {
    if input.from_status_id == input.to_status_id {
        return Err(CoreError::Validation(
            "A transition must connect two different statuses".into(),
        )
        .into());
    }

    let mut tx = pool.begin().await?;
    load(&mut tx, model_id).await?;
    find_status(&mut tx, model_id, input.from_status_id).await?;
    find_status(&mut tx, model_id, input.to_status_id).await?;

    let transition =
        StatusModelRepo::create_transition(&mut tx, model_id, input.from_status_id, input.to_status_id)
            .await?;
    tx.commit().await?;

    tracing::info!(
        status_model_id = %model_id,
        from = %transition.from_status,
        to = %transition.to_status,
        actor_id = %actor.user_id,
        "Transition added"
    );
    Ok(transition)
}

pub async fn delete_transition(
    pool: &DbPool,
    actor: &AuthUser,
    model_id: DbId,
    transition_id: DbId,
) -> AppResult<()> {
    if !StatusModelRepo::delete_transition(pool, model_id, transition_id).await? {
        return Err(CoreError::not_found("StatusTransition", transition_id).into());
    }
    tracing::info!(
        status_model_id = %model_id,
        transition_id = %transition_id,
        actor_id = %actor.user_id,
        "Transition deleted"
    );
    Ok(())
}
