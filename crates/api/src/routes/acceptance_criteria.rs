//! Route definitions for the `/acceptance-criteria` resource.

use axum::routing::{get, post};
use axum::Router;
use reqhub_core::entity::EntityType;

use super::comments;
use crate::handlers::acceptance_criteria;
use crate::state::AppState;

/// Routes mounted at `/acceptance-criteria`. `{id}` is a UUID or an `AC-`
/// reference.
///
/// ```text
/// POST   /                    -> create (user_story_id in body)
/// GET    /{id}                -> get_by_id
/// PUT    /{id}                -> update
/// DELETE /{id}                -> delete (?force=true)
/// *      /{id}/comments/...   -> see comments::entity_router
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(acceptance_criteria::create))
        .route(
            "/{id}",
            get(acceptance_criteria::get_by_id)
                .put(acceptance_criteria::update)
                .delete(acceptance_criteria::delete),
        )
        .merge(comments::entity_router(EntityType::AcceptanceCriteria))
}
