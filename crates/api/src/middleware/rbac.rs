//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role rank is
//! below the minimum. Use these in route handlers to enforce authorization
//! at the type level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use reqhub_core::roles::Role;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

async fn extract_with_role(
    parts: &mut Parts,
    state: &AppState,
    required: Role,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    user.require(required)?;
    Ok(user)
}

/// Requires the `Administrator` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        extract_with_role(parts, state, Role::Administrator)
            .await
            .map(RequireAdmin)
    }
}

/// Requires `User` or `Administrator`. Rejects with 403 Forbidden otherwise.
pub struct RequireUser(pub AuthUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        extract_with_role(parts, state, Role::User)
            .await
            .map(RequireUser)
    }
}

/// Requires any authenticated user; every role ranks at least `Commenter`.
///
/// Functionally equivalent to [`AuthUser`] but self-documenting in route
/// definitions for read and comment endpoints.
pub struct RequireCommenter(pub AuthUser);

impl FromRequestParts<AppState> for RequireCommenter {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        extract_with_role(parts, state, Role::Commenter)
            .await
            .map(RequireCommenter)
    }
}
