//! User administration and the caller's own profile.

use reqhub_core::error::CoreError;
use reqhub_core::pagination::Page;
use reqhub_core::roles::Role;
use reqhub_core::types::DbId;
use reqhub_db::models::user::{CreateUser, UpdateUser, UserResponse};
use reqhub_db::repositories::UserRepo;
use reqhub_db::DbPool;
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthMethod, AuthUser};

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 50;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Defaults to `User`.
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// `GET /auth/profile` body: the stored user plus how this request authenticated.
#[derive(Debug, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: UserResponse,
    pub auth_method: AuthMethod,
}

fn validate_username(username: &str) -> AppResult<String> {
    let trimmed = username.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "username must be between 1 and {MAX_USERNAME_LENGTH} characters"
        ))
        .into());
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(CoreError::Validation("username must not contain whitespace".into()).into());
    }
    Ok(trimmed.to_string())
}

fn validate_email(email: &str) -> AppResult<String> {
    let trimmed = email.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
            Ok(trimmed.to_string())
        }
        _ => Err(CoreError::Validation(format!("'{trimmed}' is not a valid email address")).into()),
    }
}

fn parse_role(raw: &str) -> AppResult<Role> {
    Role::parse(raw.trim()).ok_or_else(|| {
        CoreError::Validation(format!(
            "Unknown role '{raw}'; expected one of {}",
            Role::ALL.join(", ")
        ))
        .into()
    })
}

pub async fn list(pool: &DbPool, page: Page) -> AppResult<(Vec<UserResponse>, i64)> {
    let users = UserRepo::list(pool, page).await?;
    let total = UserRepo::count(pool).await?;
    Ok((users.iter().map(UserResponse::from).collect(), total))
}

pub async fn get(pool: &DbPool, id: DbId) -> AppResult<UserResponse> {
    let user = UserRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", id))?;
    Ok(UserResponse::from(&user))
}

pub async fn profile(pool: &DbPool, actor: &AuthUser) -> AppResult<Profile> {
    Ok(Profile {
        user: get(pool, actor.user_id).await?,
        auth_method: actor.auth_method,
    })
}

/// Create a user. Used by the admin API and by the startup seed.
pub async fn create(pool: &DbPool, input: CreateUserRequest) -> AppResult<UserResponse> {
    let username = validate_username(&input.username)?;
    let email = validate_email(&input.email)?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(CoreError::Validation)?;
    let role = input.role.as_deref().map(parse_role).transpose()?.unwrap_or(Role::User);

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            username,
            email,
            password_hash,
            role,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, username = %user.username, role = %user.role, "User created");
    Ok(UserResponse::from(&user))
}

pub async fn update(
    pool: &DbPool,
    actor: &AuthUser,
    id: DbId,
    input: UpdateUserRequest,
) -> AppResult<UserResponse> {
    let username = input.username.as_deref().map(validate_username).transpose()?;
    let email = input.email.as_deref().map(validate_email).transpose()?;
    let role = input.role.as_deref().map(parse_role).transpose()?;

    if id == actor.user_id && role.is_some_and(|r| r != Role::Administrator) {
        return Err(CoreError::Validation("Administrators cannot demote themselves".into()).into());
    }

    let user = UserRepo::update(pool, id, &UpdateUser { username, email, role })
        .await?
        .ok_or_else(|| CoreError::not_found("User", id))?;

    tracing::info!(user_id = %id, actor_id = %actor.user_id, "User updated");
    Ok(UserResponse::from(&user))
}

/// Delete a user. Fails with `conflict_in_use` while any entity or comment
/// still references them.
pub async fn delete(pool: &DbPool, actor: &AuthUser, id: DbId) -> AppResult<()> {
    if id == actor.user_id {
        return Err(CoreError::Validation("Administrators cannot delete themselves".into()).into());
    }
    let deleted = UserRepo::delete(pool, id).await.map_err(|err| match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            AppError::Core(CoreError::InUse(
                "User is still referenced by entities or comments; reassign them first".into(),
            ))
        }
        _ => AppError::Database(err),
    })?;
    if !deleted {
        return Err(CoreError::not_found("User", id).into());
    }

    tracing::info!(user_id = %id, actor_id = %actor.user_id, "User deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn usernames_are_trimmed_and_bounded() {
        assert_eq!(validate_username("  alice ").unwrap(), "alice");
        assert_matches!(validate_username(""), Err(AppError::Core(CoreError::Validation(_))));
        assert_matches!(validate_username("a b"), Err(AppError::Core(CoreError::Validation(_))));
        let long = "x".repeat(MAX_USERNAME_LENGTH + 1);
        assert_matches!(validate_username(&long), Err(AppError::Core(CoreError::Validation(_))));
    }

    #[test]
    fn email_needs_local_part_and_dotted_domain() {
        assert!(validate_email("dev@example.com").is_ok());
        assert!(validate_email("dev@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("no-at-sign").is_err());
    }

    #[test]
    fn roles_parse_by_name() {
        assert_eq!(parse_role("Administrator").unwrap(), Role::Administrator);
        assert_eq!(parse_role(" Commenter ").unwrap(), Role::Commenter);
        assert!(parse_role("root").is_err());
    }
}
