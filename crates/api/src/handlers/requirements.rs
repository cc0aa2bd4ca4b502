//! Handlers for the `/requirements` resource and requirement relationships.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use reqhub_core::types::DbId;
use reqhub_db::models::relationship::RelationshipView;
use reqhub_db::models::requirement::Requirement;

use super::{AssignRequest, StatusChangeRequest};
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::rbac::{RequireCommenter, RequireUser};
use crate::query::{EntityListParams, ForceParams, PaginationParams};
use crate::response::PaginatedResponse;
use crate::services::relationships::{self, CreateRelationshipInput};
use crate::services::requirements::{self, CreateRequirementInput, UpdateRequirementInput};
use crate::state::AppState;

/// POST /api/v1/requirements
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateRequirementInput>,
) -> AppResult<(StatusCode, Json<Requirement>)> {
    let requirement = requirements::create(&state.pool, &user, input).await?;
    Ok((StatusCode::CREATED, Json(requirement)))
}

/// GET /api/v1/requirements
pub async fn list(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<EntityListParams>,
) -> AppResult<Json<PaginatedResponse<Requirement>>> {
    let filter = params.into_filter()?;
    let (items, total) = requirements::list(&state.pool, None, &filter).await?;
    Ok(Json(PaginatedResponse::new(items, total, filter.page)))
}

/// GET /api/v1/requirements/{id}
pub async fn get_by_id(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<Requirement>> {
    Ok(Json(requirements::get(&state.pool, &id).await?))
}

/// PUT /api/v1/requirements/{id}
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<UpdateRequirementInput>,
) -> AppResult<Json<Requirement>> {
    Ok(Json(
        requirements::update(&state.pool, &user, &id, input).await?,
    ))
}

/// PATCH /api/v1/requirements/{id}/status
pub async fn change_status(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<StatusChangeRequest>,
) -> AppResult<Json<Requirement>> {
    Ok(Json(
        requirements::change_status(&state.pool, &user, &id, &input.status).await?,
    ))
}

/// PATCH /api/v1/requirements/{id}/assign
pub async fn assign(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<AssignRequest>,
) -> AppResult<Json<Requirement>> {
    Ok(Json(
        requirements::assign(&state.pool, &user, &id, input.assignee_id).await?,
    ))
}

/// DELETE /api/v1/requirements/{id}?force=
pub async fn delete(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppQuery(params): AppQuery<ForceParams>,
) -> AppResult<StatusCode> {
    requirements::delete(&state.pool, &user, &id, params.force).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

/// POST /api/v1/requirements/relationships
pub async fn create_relationship(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateRelationshipInput>,
) -> AppResult<(StatusCode, Json<RelationshipView>)> {
    let relationship = relationships::create(&state.pool, &user, input).await?;
    Ok((StatusCode::CREATED, Json(relationship)))
}

/// GET /api/v1/requirements/{id}/relationships
pub async fn list_relationships(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> AppResult<Json<PaginatedResponse<RelationshipView>>> {
    let page = params.page()?;
    let (items, total) = relationships::list_for_requirement(&state.pool, &id, page).await?;
    Ok(Json(PaginatedResponse::new(items, total, page)))
}

/// DELETE /api/v1/requirements/relationships/{id}
pub async fn delete_relationship(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<StatusCode> {
    relationships::delete(&state.pool, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
