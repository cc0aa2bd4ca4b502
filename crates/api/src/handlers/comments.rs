//! Handlers for comments.
//!
//! Entity-scoped handlers read the subject type from an [`Extension`] set by
//! [`crate::routes::comments::entity_router`], so one set of handlers serves
//! `/epics/{id}/comments`, `/user-stories/{id}/comments` and the rest.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use reqhub_core::entity::EntityType;
use reqhub_core::types::DbId;
use reqhub_db::models::comment::CommentView;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::rbac::RequireCommenter;
use crate::query::PaginationParams;
use crate::response::{DataResponse, PaginatedResponse};
use crate::services::comments::{
    self, AnchorCheck, CreateCommentInput, CreateInlineCommentInput, ListCommentsQuery,
    UpdateCommentInput, ValidateAnchorsInput,
};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Entity-scoped
// ---------------------------------------------------------------------------

/// GET /api/v1/{entity}/{id}/comments?inline=&threaded=&status=&limit=&offset=
pub async fn list_for_entity(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    Extension(entity): Extension<EntityType>,
    AppPath(id): AppPath<String>,
    AppQuery(query): AppQuery<ListCommentsQuery>,
) -> AppResult<Json<PaginatedResponse<CommentView>>> {
    let page = comments::list(&state.pool, entity, &id, &query).await?;
    Ok(Json(PaginatedResponse::new(page.items, page.total, page.page)))
}

/// POST /api/v1/{entity}/{id}/comments
pub async fn create(
    RequireCommenter(user): RequireCommenter,
    State(state): State<AppState>,
    Extension(entity): Extension<EntityType>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<CreateCommentInput>,
) -> AppResult<(StatusCode, Json<CommentView>)> {
    let comment = comments::create(&state.pool, &user, entity, &id, input).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// POST /api/v1/{entity}/{id}/comments/inline
pub async fn create_inline(
    RequireCommenter(user): RequireCommenter,
    State(state): State<AppState>,
    Extension(entity): Extension<EntityType>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<CreateInlineCommentInput>,
) -> AppResult<(StatusCode, Json<CommentView>)> {
    let comment = comments::create_inline(&state.pool, &user, entity, &id, input).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /api/v1/{entity}/{id}/comments/inline/visible
pub async fn list_visible_inline(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    Extension(entity): Extension<EntityType>,
    AppPath(id): AppPath<String>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> AppResult<Json<PaginatedResponse<CommentView>>> {
    let page = comments::list_visible_inline(&state.pool, entity, &id, params.page()?).await?;
    Ok(Json(PaginatedResponse::new(page.items, page.total, page.page)))
}

/// POST /api/v1/{entity}/{id}/comments/inline/validate
///
/// Dry run: how would the inline comments fare against `description`.
pub async fn validate_inline(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    Extension(entity): Extension<EntityType>,
    AppPath(id): AppPath<String>,
    AppJson(input): AppJson<ValidateAnchorsInput>,
) -> AppResult<Json<DataResponse<Vec<AnchorCheck>>>> {
    let data = comments::validate_inline(&state.pool, entity, &id, input).await?;
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// By comment id
// ---------------------------------------------------------------------------

/// GET /api/v1/comments/{id}
pub async fn get_by_id(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<CommentView>> {
    Ok(Json(comments::get(&state.pool, id).await?))
}

/// PUT /api/v1/comments/{id}
///
/// Author or Administrator only.
pub async fn update(
    RequireCommenter(user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppJson(input): AppJson<UpdateCommentInput>,
) -> AppResult<Json<CommentView>> {
    Ok(Json(comments::update(&state.pool, &user, id, input).await?))
}

/// DELETE /api/v1/comments/{id}
///
/// Author or Administrator only. Replies are removed with the comment.
pub async fn delete(
    RequireCommenter(user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<StatusCode> {
    comments::delete(&state.pool, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/comments/{id}/resolve
pub async fn resolve(
    RequireCommenter(user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<CommentView>> {
    Ok(Json(comments::set_resolved(&state.pool, &user, id, true).await?))
}

/// POST /api/v1/comments/{id}/unresolve
pub async fn unresolve(
    RequireCommenter(user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<CommentView>> {
    Ok(Json(comments::set_resolved(&state.pool, &user, id, false).await?))
}

/// GET /api/v1/comments/{id}/replies
pub async fn replies(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> AppResult<Json<PaginatedResponse<CommentView>>> {
    let page = comments::replies(&state.pool, id, params.page()?).await?;
    Ok(Json(PaginatedResponse::new(page.items, page.total, page.page)))
}
