//! Handlers for user administration (`/auth/users`). Administrator only.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use reqhub_core::types::DbId;
use reqhub_db::models::user::UserResponse;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::PaginatedResponse;
use crate::services::users::{self, CreateUserRequest, UpdateUserRequest};
use crate::state::AppState;

/// GET /api/v1/auth/users?limit=&offset=
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> AppResult<Json<PaginatedResponse<UserResponse>>> {
    let page = params.page()?;
    let (items, total) = users::list(&state.pool, page).await?;
    Ok(Json(PaginatedResponse::new(items, total, page)))
}

/// GET /api/v1/auth/users/{id}
pub async fn get_by_id(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(users::get(&state.pool, id).await?))
}

/// POST /api/v1/auth/users
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = users::create(&state.pool, input).await?;
    tracing::info!(user_id = %user.id, actor_id = %admin.user_id, "User created by administrator");
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/v1/auth/users/{id}
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppJson(input): AppJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(users::update(&state.pool, &admin, id, input).await?))
}

/// DELETE /api/v1/auth/users/{id}
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<StatusCode> {
    users::delete(&state.pool, &admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
