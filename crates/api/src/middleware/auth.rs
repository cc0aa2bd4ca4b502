//! Bearer authentication extractor for Axum handlers.
//!
//! The raw bearer value is routed on syntax: values starting with the PAT
//! prefix take the personal-access-token path, everything else is treated
//! as a signed access token.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use reqhub_core::error::CoreError;
use reqhub_core::roles::Role;
use reqhub_core::tokens::{hash_token, is_pat, pat_display_prefix, PAT_PREFIX};
use reqhub_core::types::DbId;
use reqhub_db::repositories::{PatRepo, UserRepo};
use serde::Serialize;

use crate::auth::jwt::{validate_token, JwtConfig, TokenError};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// How the current request authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Jwt,
    Pat,
}

/// Authenticated principal extracted from the `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub username: String,
    pub role: Role,
    pub auth_method: AuthMethod,
}

impl AuthUser {
    /// Reject with 403 unless the principal's rank meets `required`.
    pub fn require(&self, required: Role) -> AppResult<()> {
        if self.role.satisfies(required) {
            Ok(())
        } else {
            Err(AppError::Core(CoreError::Forbidden(format!(
                "{required} role or higher required"
            ))))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        authenticate(state, token.trim()).await
    }
}

/// Resolve a raw bearer value to a principal.
pub async fn authenticate(state: &AppState, token: &str) -> AppResult<AuthUser> {
    if is_pat(token) {
        authenticate_pat(state, token).await
    } else {
        authenticate_jwt(&state.config.jwt, token)
    }
}

fn authenticate_jwt(config: &JwtConfig, token: &str) -> AppResult<AuthUser> {
    let claims = validate_token(token, config).map_err(|e| {
        let reason = match e {
            TokenError::Expired => "Token expired",
            TokenError::Invalid => "Invalid token",
        };
        tracing::warn!(target: "security", auth_method = "jwt", reason, "Authentication failed");
        AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
    })?;

    let role = Role::parse(&claims.role).ok_or_else(|| {
        tracing::warn!(target: "security", user_id = %claims.sub, "Token carries unknown role");
        AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
    })?;

    tracing::info!(
        target: "security",
        auth_method = "jwt",
        user_id = %claims.sub,
        role = %role,
        "Authenticated"
    );

    Ok(AuthUser {
        user_id: claims.sub,
        username: claims.username,
        role,
        auth_method: AuthMethod::Jwt,
    })
}

async fn authenticate_pat(state: &AppState, token: &str) -> AppResult<AuthUser> {
    let prefix = pat_display_prefix(token).unwrap_or_default();
    let unauthorized =
        || AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()));

    let Some(pat) = PatRepo::find_by_hash(&state.pool, &hash_token(token)).await? else {
        tracing::warn!(
            target: "security",
            auth_method = "pat",
            token_prefix = %format!("{PAT_PREFIX}{prefix}"),
            "Unknown personal access token"
        );
        return Err(unauthorized());
    };

    if pat.expires_at <= Utc::now() {
        tracing::warn!(
            target: "security",
            auth_method = "pat",
            user_id = %pat.user_id,
            token_id = %pat.id,
            token_prefix = %pat.token_prefix,
            "Expired personal access token used"
        );
        return Err(unauthorized());
    }

    let user = UserRepo::find_by_id(&state.pool, pat.user_id)
        .await?
        .ok_or_else(unauthorized)?;

    PatRepo::touch(&state.pool, pat.id).await?;

    tracing::info!(
        target: "security",
        auth_method = "pat",
        user_id = %user.id,
        token_prefix = %pat.token_prefix,
        "Authenticated"
    );

    Ok(AuthUser {
        user_id: user.id,
        role: user.role(),
        username: user.username,
        auth_method: AuthMethod::Pat,
    })
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;
    use uuid::Uuid;

    use super::*;
    use crate::auth::jwt::generate_access_token;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "middleware-test-secret-long-enough".to_string(),
            access_token_expiry_mins: 5,
            refresh_token_expiry_days: 1,
        }
    }

    fn with_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        (result, logs)
    }

    #[test]
    fn successful_jwt_authentication_is_a_security_event() {
        let config = config();
        let user_id = Uuid::new_v4();
        let token = generate_access_token(user_id, "auditor", Role::User, &config).unwrap();

        let (user, logs) = with_logs(|| authenticate_jwt(&config, &token));
        let user = user.unwrap();

        assert_eq!(user.user_id, user_id);
        assert_eq!(user.auth_method, AuthMethod::Jwt);
        assert!(logs.contains("security"), "{logs}");
        assert!(logs.contains("Authenticated"), "{logs}");
        assert!(logs.contains(&user_id.to_string()), "{logs}");
    }

    #[test]
    fn rejected_jwt_is_logged_as_failure() {
        let (result, logs) = with_logs(|| authenticate_jwt(&config(), "not.a.jwt"));

        assert!(result.is_err());
        assert!(logs.contains("Authentication failed"), "{logs}");
        assert!(!logs.contains("Authenticated"), "{logs}");
    }
}
