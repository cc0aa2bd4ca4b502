//! Domain services shared by the HTTP handlers and the JSON-RPC tools.
//!
//! Every mutation runs in one transaction opened here; repositories never
//! commit on their own. Services take the pool plus the acting principal and
//! return [`AppResult`] so both surfaces translate errors the same way.

pub mod acceptance_criteria;
pub mod auth;
pub mod cascade;
pub mod comments;
pub mod epics;
pub mod hierarchy;
pub mod lookups;
pub mod relationships;
pub mod requirements;
pub mod search;
pub mod status_models;
pub mod user_stories;
pub mod users;
pub mod workflow;

use reqhub_core::entity::{validate_priority, EntityType};
use reqhub_core::error::CoreError;
use reqhub_core::reference_id::Identifier;
use reqhub_core::types::DbId;
use reqhub_db::repositories::UserRepo;
use sqlx::PgExecutor;

use crate::error::AppResult;

/// Priority applied when a create request omits it (Medium).
pub const DEFAULT_PRIORITY: i16 = 3;

/// Parse an identifier-or-reference for the expected entity type.
pub(crate) fn parse_identifier(raw: &str, entity: EntityType) -> AppResult<Identifier> {
    Ok(Identifier::parse(raw, entity)?)
}

/// Validate an optional priority, defaulting to [`DEFAULT_PRIORITY`].
pub(crate) fn resolve_priority(priority: Option<i16>) -> AppResult<i16> {
    Ok(validate_priority(priority.unwrap_or(DEFAULT_PRIORITY))?)
}

/// Reject a reference to a user that does not exist.
pub(crate) async fn ensure_user_exists<'e>(
    db: impl PgExecutor<'e>,
    user_id: DbId,
    field: &str,
) -> AppResult<()> {
    if UserRepo::exists(db, user_id).await? {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("{field} {user_id} does not refer to an existing user")).into())
    }
}

/// Treat an empty or whitespace-only optional string as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
