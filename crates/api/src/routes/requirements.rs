//! Route definitions for the `/requirements` resource.

use axum::routing::{delete, get, patch, post};
use axum::Router;
use reqhub_core::entity::EntityType;

use super::comments;
use crate::handlers::requirements;
use crate::state::AppState;

/// Routes mounted at `/requirements`. `{id}` is a UUID or a `REQ-`
/// reference; the static `/relationships` segment wins over `{id}`.
///
/// ```text
/// GET    /                        -> list
/// POST   /                        -> create (user_story_id in body)
/// POST   /relationships           -> create_relationship
/// DELETE /relationships/{id}      -> delete_relationship
/// GET    /{id}                    -> get_by_id
/// PUT    /{id}                    -> update
/// DELETE /{id}                    -> delete (?force=true)
/// PATCH  /{id}/status             -> change_status
/// PATCH  /{id}/assign             -> assign
/// GET    /{id}/relationships      -> list_relationships
/// *      /{id}/comments/...       -> see comments::entity_router
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(requirements::list).post(requirements::create))
        .route("/relationships", post(requirements::create_relationship))
        .route(
            "/relationships/{id}",
            delete(requirements::delete_relationship),
        )
        .route(
            "/{id}",
            get(requirements::get_by_id)
                .put(requirements::update)
                .delete(requirements::delete),
        )
        .route("/{id}/status", patch(requirements::change_status))
        .route("/{id}/assign", patch(requirements::assign))
        .route("/{id}/relationships", get(requirements::list_relationships))
        .merge(comments::entity_router(EntityType::Requirement))
}
