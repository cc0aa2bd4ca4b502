//! Handlers for the `/user-stories` resource and its nested criteria and
//! requirements.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use reqhub_db::models::acceptance_criteria::AcceptanceCriteria;
use reqhub_db::models::requirement::Requirement;
use reqhub_db::models::user_story::UserStory;

use super::{AssignRequest, StatusChangeRequest};
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::rbac::{RequireCommenter, RequireUser};
use crate::query::{EntityListParams, ForceParams, PaginationParams};
use crate::response::PaginatedResponse;
use crate::services::acceptance_criteria::{self, CreateAcceptanceCriteriaInput};
use crate::services::requirements::{self, CreateRequirementInput};
use crate::services::user_stories::{self, CreateUserStoryInput, UpdateUserStoryInput};
use crate::state::AppState;

/// POST /api/v1/user-stories
///
/// The parent epic comes from `epic_id` in the body.
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateUserStoryInput>,
) -> AppResult<(StatusCode, Json<UserStory>)> {
    let story = user_stories::create(&state.pool, &user, input).await?;
    Ok((StatusCode::CREATED, Json(story)))
}

/// GET /api/v1/user-stories
pub async fn list(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<EntityListParams>,
) -> AppResult<Json<PaginatedResponse<UserStory>>> {
    let filter = params.into_filter()?;
    let (items, total) = user_stories::list(&state.pool, None, &filter).await?;
    Ok(Json(PaginatedResponse::new(items, total, filter.page)))
}

/// GET /api/v1/user-stories/{id}
pub async fn get_by_id(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> AppResult<Json<UserStory>> {
    Ok(Json(user_stories::get(&state.pool, &id).await?))
}

/// PUT /api/v1/user-stories/{id}
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<UpdateUserStoryInput>,
) -> AppResult<Json<UserStory>> {
    Ok(Json(
        user_stories::update(&state.pool, &user, &id, input).await?,
    ))
}

/// PATCH /api/v1/user-stories/{id}/status
pub async fn change_status(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<StatusChangeRequest>,
) -> AppResult<Json<UserStory>> {
    Ok(Json(
        user_stories::change_status(&state.pool, &user, &id, &input.status).await?,
    ))
}

/// PATCH /api/v1/user-stories/{id}/assign
pub async fn assign(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<AssignRequest>,
) -> AppResult<Json<UserStory>> {
    Ok(Json(
        user_stories::assign(&state.pool, &user, &id, input.assignee_id).await?,
    ))
}

/// DELETE /api/v1/user-stories/{id}?force=
pub async fn delete(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppQuery(params): AppQuery<ForceParams>,
) -> AppResult<StatusCode> {
    user_stories::delete(&state.pool, &user, &id, params.force).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Nested acceptance criteria
// ---------------------------------------------------------------------------

/// GET /api/v1/user-stories/{id}/acceptance-criteria
pub async fn list_acceptance_criteria(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> AppResult<Json<PaginatedResponse<AcceptanceCriteria>>> {
    let page = params.page()?;
    let (items, total) = acceptance_criteria::list_for_story(&state.pool, &id, page).await?;
    Ok(Json(PaginatedResponse::new(items, total, page)))
}

/// POST /api/v1/user-stories/{id}/acceptance-criteria
pub async fn create_acceptance_criteria(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(mut input): AppJson<CreateAcceptanceCriteriaInput>,
) -> AppResult<(StatusCode, Json<AcceptanceCriteria>)> {
    input.user_story_id = Some(id);
    let criteria = acceptance_criteria::create(&state.pool, &user, input).await?;
    Ok((StatusCode::CREATED, Json(criteria)))
}

// ---------------------------------------------------------------------------
// Nested requirements
// ---------------------------------------------------------------------------

/// GET /api/v1/user-stories/{id}/requirements
pub async fn list_requirements(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppQuery(params): AppQuery<EntityListParams>,
) -> AppResult<Json<PaginatedResponse<Requirement>>> {
    let filter = params.into_filter()?;
    let (items, total) = requirements::list(&state.pool, Some(&id), &filter).await?;
    Ok(Json(PaginatedResponse::new(items, total, filter.page)))
}

/// POST /api/v1/user-stories/{id}/requirements
pub async fn create_requirement(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(mut input): AppJson<CreateRequirementInput>,
) -> AppResult<(StatusCode, Json<Requirement>)> {
    input.user_story_id = Some(id);
    let requirement = requirements::create(&state.pool, &user, input).await?;
    Ok((StatusCode::CREATED, Json(requirement)))
}
