//! Handlers for status model configuration (`/config/status-models`).
//!
//! Reads are open to any authenticated user so clients can render
//! workflows; every write requires an Administrator.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use reqhub_core::types::DbId;
use reqhub_db::models::status_model::{Status, StatusModel, StatusModelDetail, StatusTransition};
use serde::Deserialize;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::rbac::{RequireAdmin, RequireCommenter};
use crate::response::DataResponse;
use crate::services::status_models::{
    self, CreateStatusInput, CreateStatusModelInput, CreateTransitionInput, UpdateStatusInput,
    UpdateStatusModelInput,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatusModelListParams {
    pub entity_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// GET /api/v1/config/status-models?entity_type=
pub async fn list(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<StatusModelListParams>,
) -> AppResult<Json<DataResponse<Vec<StatusModel>>>> {
    let data = status_models::list(&state.pool, params.entity_type.as_deref()).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/config/status-models/{id}
pub async fn get_by_id(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<StatusModelDetail>> {
    Ok(Json(status_models::get(&state.pool, id).await?))
}

/// GET /api/v1/config/status-models/default/{entity_type}
pub async fn get_default(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(entity_type): AppPath<String>,
) -> AppResult<Json<StatusModelDetail>> {
    Ok(Json(
        status_models::get_default(&state.pool, &entity_type).await?,
    ))
}

/// POST /api/v1/config/status-models
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateStatusModelInput>,
) -> AppResult<(StatusCode, Json<StatusModelDetail>)> {
    let model = status_models::create(&state.pool, &admin, input).await?;
    Ok((StatusCode::CREATED, Json(model)))
}

/// PUT /api/v1/config/status-models/{id}
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppJson(input): AppJson<UpdateStatusModelInput>,
) -> AppResult<Json<StatusModel>> {
    Ok(Json(
        status_models::update(&state.pool, &admin, id, input).await?,
    ))
}

/// POST /api/v1/config/status-models/{id}/default
///
/// Make this model the one that drives its entity type's workflow.
pub async fn set_default(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<StatusModel>> {
    Ok(Json(status_models::set_default(&state.pool, &admin, id).await?))
}

/// DELETE /api/v1/config/status-models/{id}
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<StatusCode> {
    status_models::delete(&state.pool, &admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

/// POST /api/v1/config/status-models/{id}/statuses
pub async fn add_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppPath(model_id): AppPath<DbId>,
    AppJson(input): AppJson<CreateStatusInput>,
) -> AppResult<(StatusCode, Json<Status>)> {
    let status = status_models::add_status(&state.pool, &admin, model_id, input).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

/// PUT /api/v1/config/status-models/{id}/statuses/{status_id}
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppPath((model_id, status_id)): AppPath<(DbId, DbId)>,
    AppJson(input): AppJson<UpdateStatusInput>,
) -> AppResult<Json<Status>> {
    Ok(Json(
        status_models::update_status(&state.pool, &admin, model_id, status_id, input).await?,
    ))
}

/// DELETE /api/v1/config/status-models/{id}/statuses/{status_id}
pub async fn delete_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppPath((model_id, status_id)): AppPath<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    status_models::delete_status(&state.pool, &admin, model_id, status_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// POST /api/v1/config/status-models/{id}/transitions
pub async fn add_transition(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppPath(model_id): AppPath<DbId>,
    AppJson(input): AppJson<CreateTransitionInput>,
) -> AppResult<(StatusCode, Json<StatusTransition>)> {
    let transition = status_models::add_transition(&state.pool, &admin, model_id, input).await?;
    Ok((StatusCode::CREATED, Json(transition)))
}

/// DELETE /api/v1/config/status-models/{id}/transitions/{transition_id}
pub async fn delete_transition(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppPath((model_id, transition_id)): AppPath<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    status_models::delete_transition(&state.pool, &admin, model_id, transition_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
