//! Route definitions for the `/epics` resource.

use axum::routing::{get, patch};
use axum::Router;
use reqhub_core::entity::EntityType;

use super::comments;
use crate::handlers::epics;
use crate::state::AppState;

/// Routes mounted at `/epics`. `{id}` is a UUID or an `EP-` reference.
///
/// ```text
/// GET    /                    -> list
/// POST   /                    -> create
/// GET    /{id}                -> get_by_id
/// PUT    /{id}                -> update
/// DELETE /{id}                -> delete (?force=true cascades)
/// PATCH  /{id}/status         -> change_status
/// PATCH  /{id}/assign         -> assign
/// GET    /{id}/hierarchy      -> get_hierarchy
/// GET    /{id}/user-stories   -> list_user_stories
/// POST   /{id}/user-stories   -> create_user_story
/// *      /{id}/comments/...   -> see comments::entity_router
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(epics::list).post(epics::create))
        .route(
            "/{id}",
            get(epics::get_by_id)
                .put(epics::update)
                .delete(epics::delete),
        )
        .route("/{id}/status", patch(epics::change_status))
        .route("/{id}/assign", patch(epics::assign))
        .route("/{id}/hierarchy", get(epics::get_hierarchy))
        .route(
            "/{id}/user-stories",
            get(epics::list_user_stories).post(epics::create_user_story),
        )
        .merge(comments::entity_router(EntityType::Epic))
}
