//! Status resolution against the configured workflow of an entity type.
//!
//! The default status model of the type is loaded inside the caller's
//! transaction; when none is configured the built-in bootstrap model applies.

use reqhub_core::entity::EntityType;
use reqhub_core::error::CoreError;
use reqhub_core::workflow::WorkflowModel;
use reqhub_db::repositories::StatusModelRepo;
use sqlx::PgConnection;

use crate::error::AppResult;

/// The effective workflow for `entity`.
pub async fn load(conn: &mut PgConnection, entity: EntityType) -> AppResult<WorkflowModel> {
    let configured = StatusModelRepo::load_workflow(conn, entity)
        .await?
        .filter(|model| !model.statuses.is_empty());
    Ok(configured.unwrap_or_else(|| WorkflowModel::builtin(entity)))
}

/// Status for a newly created entity.
///
/// A requested status is accepted only when it is the initial one.
pub async fn status_for_create(
    conn: &mut PgConnection,
    entity: EntityType,
    requested: Option<&str>,
) -> AppResult<String> {
    let model = load(conn, entity).await?;
    match requested.map(str::trim).filter(|s| !s.is_empty()) {
        Some(status) => Ok(model.validate_transition(None, status)?),
        None => initial_of(&model, entity),
    }
}

/// Authorize `from -> to`, returning the canonical spelling of `to`.
pub async fn check_transition(
    conn: &mut PgConnection,
    entity: EntityType,
    from: &str,
    to: &str,
) -> AppResult<String> {
    let model = load(conn, entity).await?;
    model.validate_transition(Some(from), to).map_err(|e| {
        tracing::debug!(entity = %entity, from, to, error = %e, "Status change rejected");
        e.into()
    })
}

/// The initial status name of `entity`'s workflow.
pub async fn initial_status(conn: &mut PgConnection, entity: EntityType) -> AppResult<String> {
    let model = load(conn, entity).await?;
    initial_of(&model, entity)
}

fn initial_of(model: &WorkflowModel, entity: EntityType) -> AppResult<String> {
    model
        .initial_status()
        .map(str::to_string)
        .ok_or_else(|| CoreError::Internal(format!("no initial status configured for {entity}")).into())
}
