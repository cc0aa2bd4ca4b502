//! Handlers for the `/auth` resource: sessions, profile and personal access
//! tokens.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use reqhub_core::types::DbId;
use reqhub_db::models::token::PersonalAccessToken;

use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::services::auth::{
    self, AuthResponse, ChangePasswordRequest, CreatePatRequest, CreatedPat, LoginRequest,
    LogoutRequest, RefreshRequest,
};
use crate::services::users::{self, Profile};
use crate::state::AppState;

/// POST /api/v1/auth/login
///
/// Authenticate with username + password. Returns access and refresh tokens.
pub async fn login(
    State(state): State<AppState>,
    AppJson(input): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    Ok(Json(auth::login(&state.pool, &state.config.jwt, input).await?))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for a new access + refresh token pair. The
/// presented token stops working.
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(input): AppJson<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    Ok(Json(auth::refresh(&state.pool, &state.config.jwt, input).await?))
}

/// POST /api/v1/auth/logout
///
/// Revoke the given refresh token, or every session of the caller when the
/// body is empty. Returns 204 No Content.
pub async fn logout(
    user: AuthUser,
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<StatusCode> {
    let input: LogoutRequest = if body.iter().all(u8::is_ascii_whitespace) {
        LogoutRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?
    };
    auth::logout(&state.pool, &user, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/change-password
pub async fn change_password(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    auth::change_password(&state.pool, &user, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/profile
pub async fn profile(user: AuthUser, State(state): State<AppState>) -> AppResult<Json<Profile>> {
    Ok(Json(users::profile(&state.pool, &user).await?))
}

// ---------------------------------------------------------------------------
// Personal access tokens
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/tokens
///
/// The plaintext token is only ever returned here.
pub async fn create_token(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(input): AppJson<CreatePatRequest>,
) -> AppResult<(StatusCode, Json<CreatedPat>)> {
    let pat = auth::create_pat(
        &state.pool,
        &user,
        state.config.pat_default_expiry_days,
        input,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(pat)))
}

/// GET /api/v1/auth/tokens
pub async fn list_tokens(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<PersonalAccessToken>>>> {
    let data = auth::list_pats(&state.pool, &user).await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/auth/tokens/{id}
pub async fn revoke_token(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<DbId>,
) -> AppResult<StatusCode> {
    auth::revoke_pat(&state.pool, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
