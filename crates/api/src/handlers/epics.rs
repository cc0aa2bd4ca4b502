//! Handlers for the `/epics` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use reqhub_db::models::epic::Epic;
use reqhub_db::models::user_story::UserStory;

use super::{AssignRequest, StatusChangeRequest};
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::rbac::{RequireCommenter, RequireUser};
use crate::query::{EntityListParams, ForceParams};
use crate::response::PaginatedResponse;
use crate::services::epics::{self, CreateEpicInput, UpdateEpicInput};
use crate::services::hierarchy::{self, EpicHierarchy};
use crate::services::user_stories::{self, CreateUserStoryInput};
use crate::state::AppState;

/// POST /api/v1/epics
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateEpicInput>,
) -> AppResult<(StatusCode, Json<Epic>)> {
    let epic = epics::create(&state.pool, &user, input).await?;
    Ok((StatusCode::CREATED, Json(epic)))
}

/// GET /api/v1/epics
pub async fn list(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<EntityListParams>,
) -> AppResult<Json<PaginatedResponse<Epic>>> {
    let filter = params.into_filter()?;
    let (items, total) = epics::list(&state.pool, &filter).await?;
    Ok(Json(PaginatedResponse::new(items, total, filter.page)))
}

/// GET /api/v1/epics/{id}
///
/// `id` is a UUID or an `EP-` reference.
pub async fn get_by_id(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<Epic>> {
    Ok(Json(epics::get(&state.pool, &id).await?))
}

/// PUT /api/v1/epics/{id}
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<UpdateEpicInput>,
) -> AppResult<Json<Epic>> {
    Ok(Json(epics::update(&state.pool, &user, &id, input).await?))
}

/// PATCH /api/v1/epics/{id}/status
pub async fn change_status(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<StatusChangeRequest>,
) -> AppResult<Json<Epic>> {
    Ok(Json(
        epics::change_status(&state.pool, &user, &id, &input.status).await?,
    ))
}

/// PATCH /api/v1/epics/{id}/assign
pub async fn assign(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<AssignRequest>,
) -> AppResult<Json<Epic>> {
    Ok(Json(
        epics::assign(&state.pool, &user, &id, input.assignee_id).await?,
    ))
}

/// DELETE /api/v1/epics/{id}?force=
pub async fn delete(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppQuery(params): AppQuery<ForceParams>,
) -> AppResult<StatusCode> {
    epics::delete(&state.pool, &user, &id, params.force).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/epics/{id}/hierarchy
pub async fn get_hierarchy(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<EpicHierarchy>> {
    Ok(Json(hierarchy::epic_hierarchy(&state.pool, &id).await?))
}

/// GET /api/v1/epics/{id}/user-stories
pub async fn list_user_stories(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppQuery(params): AppQuery<EntityListParams>,
) -> AppResult<Json<PaginatedResponse<UserStory>>> {
    let filter = params.into_filter()?;
    let (items, total) = user_stories::list(&state.pool, Some(&id), &filter).await?;
    Ok(Json(PaginatedResponse::new(items, total, filter.page)))
}

/// POST /api/v1/epics/{id}/user-stories
pub async fn create_user_story(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(mut input): AppJson<CreateUserStoryInput>,
) -> AppResult<(StatusCode, Json<UserStory>)> {
    input.epic_id = Some(id);
    let story = user_stories::create(&state.pool, &user, input).await?;
    Ok((StatusCode::CREATED, Json(story)))
}
