//! Route definitions for the `/user-stories` resource.

use axum::routing::{get, patch};
use axum::Router;
use reqhub_core::entity::EntityType;

use super::comments;
use crate::handlers::user_stories;
use crate::state::AppState;

/// Routes mounted at `/user-stories`. `{id}` is a UUID or a `US-` reference.
///
/// ```text
/// GET    /                            -> list
/// POST   /                            -> create (epic_id in body)
/// GET    /{id}                        -> get_by_id
/// PUT    /{id}                        -> update
/// DELETE /{id}                        -> delete (?force=true cascades)
/// PATCH  /{id}/status                 -> change_status
/// PATCH  /{id}/assign                 -> assign
/// GET    /{id}/acceptance-criteria    -> list_acceptance_criteria
/// POST   /{id}/acceptance-criteria    -> create_acceptance_criteria
/// GET    /{id}/requirements           -> list_requirements
/// POST   /{id}/requirements           -> create_requirement
/// *      /{id}/comments/...           -> see comments::entity_router
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(user_stories::list).post(user_stories::create))
        .route(
            "/{id}",
            get(user_stories::get_by_id)
                .put(user_stories::update)
                .delete(user_stories::delete),
        )
        .route("/{id}/status", patch(user_stories::change_status))
        .route("/{id}/assign", patch(user_stories::assign))
        .route(
            "/{id}/acceptance-criteria",
            get(user_stories::list_acceptance_criteria)
                .post(user_stories::create_acceptance_criteria),
        )
        .route(
            "/{id}/requirements",
            get(user_stories::list_requirements).post(user_stories::create_requirement),
        )
        .merge(comments::entity_router(EntityType::UserStory))
}
