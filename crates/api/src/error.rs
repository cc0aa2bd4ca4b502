use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqhub_core::error::CoreError;
use serde_json::json;

/// Application-level error type for services and HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `reqhub_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler and service return values.
pub type AppResult<T> = Result<T, AppError>;

/// Transport-neutral view of an error: what the client is allowed to see.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<&'static str>,
}

impl ErrorInfo {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "An internal error occurred",
        )
    }
}

impl AppError {
    /// Map the error onto the closed taxonomy. Internal causes are logged
    /// here and replaced by a generic message.
    pub fn info(&self) -> ErrorInfo {
        match self {
            // --- CoreError variants ---
            AppError::Core(core) => classify_core_error(core),

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => {
                ErrorInfo::new(StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ErrorInfo::internal()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let info = self.info();

        let mut body = json!({
            "error": info.message,
            "code": info.code,
        });
        if let Some(details) = info.details {
            body["details"] = json!(details);
        }

        (info.status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> ErrorInfo {
    let status = match core {
        CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::Validation(_)
        | CoreError::TextFragmentValidation(_)
        | CoreError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
        CoreError::Unauthorized(_) | CoreError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
        CoreError::Forbidden(_) | CoreError::InvalidTransition { .. } => StatusCode::FORBIDDEN,
        CoreError::Duplicate(_) | CoreError::InUse(_) | CoreError::LastAcceptanceCriteria(_) => {
            StatusCode::CONFLICT
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            return ErrorInfo::internal();
        }
    };

    let message = match core {
        CoreError::Validation(msg)
        | CoreError::TextFragmentValidation(msg)
        | CoreError::Unauthorized(msg)
        | CoreError::Forbidden(msg)
        | CoreError::Duplicate(msg)
        | CoreError::InUse(msg)
        | CoreError::LastAcceptanceCriteria(msg) => msg.clone(),
        other => other.to_string(),
    };

    ErrorInfo {
        status,
        code: core.code(),
        message,
        details: core.details(),
    }
}

/// Classify a sqlx error into a status, taxonomy code and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations (`23505`) map to 409 `conflict_duplicate`.
/// - Foreign-key violations (`23503`) map to 409 `conflict_in_use`.
/// - Check violations (`23514`) map to 400 `validation_error`.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> ErrorInfo {
    match err {
        sqlx::Error::RowNotFound => {
            ErrorInfo::new(StatusCode::NOT_FOUND, "not_found", "Resource not found")
        }
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            match db_err.code().as_deref() {
                Some("23505") => ErrorInfo::new(
                    StatusCode::CONFLICT,
                    "conflict_duplicate",
                    format!("Duplicate value violates unique constraint: {constraint}"),
                ),
                Some("23503") => ErrorInfo::new(
                    StatusCode::CONFLICT,
                    "conflict_in_use",
                    format!("Operation violates a reference constraint: {constraint}"),
                ),
                Some("23514") => ErrorInfo::new(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    format!("Value violates check constraint: {constraint}"),
                ),
                _ => {
                    tracing::error!(error = %db_err, "Database error");
                    ErrorInfo::internal()
                }
            }
        }
        other => {
            tracing::error!(error = %other, "Database error");
            ErrorInfo::internal()
        }
    }
}
