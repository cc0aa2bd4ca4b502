//! Handlers for the `/acceptance-criteria` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use reqhub_db::models::acceptance_criteria::AcceptanceCriteria;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::rbac::{RequireCommenter, RequireUser};
use crate::query::ForceParams;
use crate::services::acceptance_criteria::{
    self, CreateAcceptanceCriteriaInput, UpdateAcceptanceCriteriaInput,
};
use crate::state::AppState;

/// POST /api/v1/acceptance-criteria
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateAcceptanceCriteriaInput>,
) -> AppResult<(StatusCode, Json<AcceptanceCriteria>)> {
    let criteria = acceptance_criteria::create(&state.pool, &user, input).await?;
    Ok((StatusCode::CREATED, Json(criteria)))
}

/// GET /api/v1/acceptance-criteria/{id}
pub async fn get_by_id(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<AcceptanceCriteria>> {
    Ok(Json(acceptance_criteria::get(&state.pool, &id).await?))
}

/// PUT /api/v1/acceptance-criteria/{id}
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<UpdateAcceptanceCriteriaInput>,
) -> AppResult<Json<AcceptanceCriteria>> {
    Ok(Json(
        acceptance_criteria::update(&state.pool, &user, &id, input).await?,
    ))
}

/// DELETE /api/v1/acceptance-criteria/{id}?force=
pub async fn delete(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppQuery(params): AppQuery<ForceParams>,
) -> AppResult<StatusCode> {
    acceptance_criteria::delete(&state.pool, &user, &id, params.force).await?;
    Ok(StatusCode::NO_CONTENT)
}
