//! HTTP handlers. Each one extracts, authorizes through an RBAC extractor,
//! calls into [`crate::services`] and shapes the response.

pub mod acceptance_criteria;
pub mod auth;
pub mod comments;
pub mod epics;
pub mod lookups;
pub mod requirements;
pub mod search;
pub mod status_models;
pub mod user_stories;
pub mod users;

use reqhub_core::types::DbId;
use serde::Deserialize;

/// Body of `PATCH /{entity}/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: String,
}

/// Body of `PATCH /{entity}/{id}/assign`. `null` unassigns.
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assignee_id: Option<DbId>,
}
