//! Session lifecycle and personal access tokens.
//!
//! Failures never tell a wrong password apart from an unknown user; the
//! detail goes to the `security` log target instead.

use chrono::{Duration, Utc};
use reqhub_core::error::CoreError;
use reqhub_core::tokens::{
    generate_pat, generate_refresh_token, hash_token, MAX_PAT_NAME_LENGTH, PAT_PREFIX,
};
use reqhub_core::types::{DbId, Timestamp};
use reqhub_db::models::token::{CreatePersonalAccessToken, PersonalAccessToken};
use reqhub_db::models::user::{User, UserResponse};
use reqhub_db::repositories::{PatRepo, RefreshTokenRepo, UserRepo};
use reqhub_db::DbPool;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use crate::auth::jwt::{generate_access_token, JwtConfig};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;

/// Upper bound for a PAT lifetime chosen by the client.
pub const MAX_PAT_EXPIRY_DAYS: i64 = 365;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Body of `POST /auth/logout`. Without a token every session of the caller ends.
#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePatRequest {
    pub name: String,
    pub expires_in_days: Option<i64>,
}

/// Returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// A freshly created PAT. `token` is shown exactly once.
#[derive(Debug, Serialize)]
pub struct CreatedPat {
    pub id: DbId,
    pub name: String,
    pub token: String,
    pub token_prefix: String,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid credentials".into()))
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub async fn login(pool: &DbPool, jwt: &JwtConfig, input: LoginRequest) -> AppResult<AuthResponse> {
    let username = input.username.trim();
    let Some(user) = UserRepo::find_by_username(pool, username).await? else {
        tracing::warn!(target: "security", username, reason = "unknown_user", "Login failed");
        return Err(invalid_credentials());
    };

    let valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        tracing::warn!(
            target: "security",
            user_id = %user.id,
            username,
            reason = "wrong_password",
            "Login failed"
        );
        return Err(invalid_credentials());
    }

    let response = issue_tokens(pool, jwt, &user).await?;
    tracing::info!(target: "security", user_id = %user.id, username, "Login succeeded");
    Ok(response)
}

/// Rotate a refresh token: the presented row is deleted and a new one is
/// inserted in the same transaction, so a token works at most once.
pub async fn refresh(
    pool: &DbPool,
    jwt: &JwtConfig,
    input: RefreshRequest,
) -> AppResult<AuthResponse> {
    let token_hash = hash_token(input.refresh_token.trim());

    let mut tx = pool.begin().await?;
    let Some(stored) = RefreshTokenRepo::find_by_hash_for_update(&mut *tx, &token_hash).await? else {
        tracing::warn!(target: "security", reason = "unknown_token", "Refresh failed");
        return Err(CoreError::InvalidRefreshToken.into());
    };
    if stored.expires_at <= Utc::now() {
        RefreshTokenRepo::delete(&mut *tx, stored.id).await?;
        tx.commit().await?;
        tracing::warn!(
            target: "security",
            user_id = %stored.user_id,
            reason = "expired",
            "Refresh failed"
        );
        return Err(CoreError::InvalidRefreshToken.into());
    }

    RefreshTokenRepo::touch(&mut *tx, stored.id).await?;
    let user = UserRepo::find_by_id(&mut *tx, stored.user_id)
        .await?
        .ok_or(CoreError::InvalidRefreshToken)?;
    RefreshTokenRepo::delete(&mut *tx, stored.id).await?;
    let response = issue_tokens(&mut *tx, jwt, &user).await?;
    tx.commit().await?;

    tracing::info!(target: "security", user_id = %user.id, "Refresh token rotated");
    Ok(response)
}

pub async fn logout(pool: &DbPool, actor: &AuthUser, input: LogoutRequest) -> AppResult<()> {
    match super::non_blank(input.refresh_token) {
        Some(token) => {
            let removed = RefreshTokenRepo::delete_by_hash_for_user(
                pool,
                actor.user_id,
                &hash_token(token.trim()),
            )
            .await?;
            tracing::info!(target: "security", user_id = %actor.user_id, removed, "Logout");
        }
        None => {
            let removed = RefreshTokenRepo::delete_all_for_user(pool, actor.user_id).await?;
            tracing::info!(
                target: "security",
                user_id = %actor.user_id,
                sessions = removed,
                "Logout from all sessions"
            );
        }
    }
    Ok(())
}

/// Change the caller's password. All refresh tokens are revoked.
pub async fn change_password(
    pool: &DbPool,
    actor: &AuthUser,
    input: ChangePasswordRequest,
) -> AppResult<()> {
    validate_password_strength(&input.new_password, MIN_PASSWORD_LENGTH)
        .map_err(CoreError::Validation)?;

    let user = UserRepo::find_by_id(pool, actor.user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", actor.user_id))?;
    let valid = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        tracing::warn!(target: "security", user_id = %user.id, "Password change rejected");
        return Err(invalid_credentials());
    }

    let new_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let mut tx = pool.begin().await?;
    UserRepo::update_password(&mut *tx, user.id, &new_hash).await?;
    RefreshTokenRepo::delete_all_for_user(&mut *tx, user.id).await?;
    tx.commit().await?;

    tracing::info!(target: "security", user_id = %user.id, "Password changed");
    Ok(())
}

/// Mint an access token plus a stored refresh token for `user`.
async fn issue_tokens<'e>(
    db: impl PgExecutor<'e>,
    jwt: &JwtConfig,
    user: &User,
) -> AppResult<AuthResponse> {
    let token = generate_access_token(user.id, &user.username, user.role(), jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let refresh = generate_refresh_token();
    let expires_at = Utc::now() + Duration::days(jwt.refresh_token_expiry_days);
    RefreshTokenRepo::create(db, user.id, &refresh.hash, expires_at).await?;

    Ok(AuthResponse {
        token,
        refresh_token: refresh.plaintext,
        token_type: "Bearer",
        expires_in: jwt.access_token_expiry_mins * 60,
        user: UserResponse::from(user),
    })
}

// ---------------------------------------------------------------------------
// Personal access tokens
// ---------------------------------------------------------------------------

pub async fn create_pat(
    pool: &DbPool,
    actor: &AuthUser,
    default_expiry_days: i64,
    input: CreatePatRequest,
) -> AppResult<CreatedPat> {
    let name = input.name.trim();
    if name.is_empty() || name.chars().count() > MAX_PAT_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "name must be between 1 and {MAX_PAT_NAME_LENGTH} characters"
        ))
        .into());
    }
    let days = input.expires_in_days.unwrap_or(default_expiry_days);
    if !(1..=MAX_PAT_EXPIRY_DAYS).contains(&days) {
        return Err(CoreError::Validation(format!(
            "expires_in_days must be between 1 and {MAX_PAT_EXPIRY_DAYS}"
        ))
        .into());
    }

    let generated = generate_pat();
    let pat = PatRepo::create(
        pool,
        &CreatePersonalAccessToken {
            user_id: actor.user_id,
            name: name.to_string(),
            token_hash: generated.hash,
            token_prefix: generated.display_prefix,
            expires_at: Utc::now() + Duration::days(days),
        },
    )
    .await?;

    tracing::info!(
        target: "security",
        user_id = %actor.user_id,
        pat_id = %pat.id,
        prefix = %format!("{PAT_PREFIX}{}", pat.token_prefix),
        expires_at = %pat.expires_at,
        "Personal access token created"
    );

    Ok(CreatedPat {
        id: pat.id,
        name: pat.name,
        token: generated.plaintext,
        token_prefix: pat.token_prefix,
        expires_at: pat.expires_at,
        created_at: pat.created_at,
    })
}

pub async fn list_pats(pool: &DbPool, actor: &AuthUser) -> AppResult<Vec<PersonalAccessToken>> {
    Ok(PatRepo::list_for_user(pool, actor.user_id).await?)
}

/// Revoke one of the caller's PATs. Someone else's token reads as not found.
pub async fn revoke_pat(pool: &DbPool, actor: &AuthUser, id: DbId) -> AppResult<()> {
    let pat = PatRepo::delete_for_user(pool, actor.user_id, id)
        .await?
        .ok_or_else(|| CoreError::not_found("PersonalAccessToken", id))?;

    tracing::info!(
        target: "security",
        user_id = %actor.user_id,
        pat_id = %pat.id,
        prefix = %format!("{PAT_PREFIX}{}", pat.token_prefix),
        "Personal access token revoked"
    );
    Ok(())
}
