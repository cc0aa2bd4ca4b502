//! Handlers for the requirement type and relationship type lookups.
//!
//! Both lookups share these handlers; the kind comes from an [`Extension`]
//! installed by [`crate::routes::config::lookup_router`].

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use reqhub_core::types::DbId;
use reqhub_db::models::lookup::LookupType;

use crate::error::AppResult;
use crate::extract::{AppJson, AppPath};
use crate::middleware::rbac::{RequireAdmin, RequireCommenter};
use crate::response::DataResponse;
use crate::services::lookups::{self, CreateLookupInput, LookupKind, UpdateLookupInput};
use crate::state::AppState;

/// GET /api/v1/config/{requirement,relationship}-types
pub async fn list(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
) -> AppResult<Json<DataResponse<Vec<LookupType>>>> {
    let data = lookups::list(&state.pool, kind).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/config/{requirement,relationship}-types/{id}
pub async fn get_by_id(
    RequireCommenter(_user): RequireCommenter,
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<Json<LookupType>> {
    Ok(Json(lookups::get(&state.pool, kind, id).await?))
}

/// POST /api/v1/config/{requirement,relationship}-types
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    AppJson(input): AppJson<CreateLookupInput>,
) -> AppResult<(StatusCode, Json<LookupType>)> {
    let created = lookups::create(&state.pool, &admin, kind, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/config/{requirement,relationship}-types/{id}
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    AppPath(id): AppPath<DbId>,
    AppJson(input): AppJson<UpdateLookupInput>,
) -> AppResult<Json<LookupType>> {
    Ok(Json(
        lookups::update(&state.pool, &admin, kind, id, input).await?,
    ))
}

/// DELETE /api/v1/config/{requirement,relationship}-types/{id}
///
/// Refused with 409 while any record uses the type.
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<StatusCode> {
    lookups::delete(&state.pool, &admin, kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
