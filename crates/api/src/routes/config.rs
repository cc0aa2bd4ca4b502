//! Route definitions for workflow and type configuration (`/config`).

use axum::routing::{delete, get, post, put};
use axum::{Extension, Router};

use crate::handlers::{lookups, status_models};
use crate::services::lookups::LookupKind;
use crate::state::AppState;

/// Routes mounted at `/config`.
///
/// ```text
/// *      /requirement-types/...    -> see lookup_router
/// *      /relationship-types/...   -> see lookup_router
///
/// GET    /status-models                                   -> list (?entity_type=)
/// POST   /status-models                                   -> create
/// GET    /status-models/default/{entity_type}             -> get_default
/// GET    /status-models/{id}                              -> get_by_id
/// PUT    /status-models/{id}                              -> update
/// DELETE /status-models/{id}                              -> delete
/// POST   /status-models/{id}/default                      -> set_default
/// POST   /status-models/{id}/statuses                     -> add_status
/// PUT    /status-models/{id}/statuses/{status_id}         -> update_status
/// DELETE /status-models/{id}/statuses/{status_id}         -> delete_status
/// POST   /status-models/{id}/transitions                  -> add_transition
/// DELETE /status-models/{id}/transitions/{transition_id}  -> delete_transition
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .nest(
            "/requirement-types",
            lookup_router(LookupKind::RequirementType),
        )
        .nest(
            "/relationship-types",
            lookup_router(LookupKind::RelationshipType),
        )
        .nest("/status-models", status_model_router())
}

/// CRUD over one lookup table.
///
/// ```text
/// GET    /        -> list
/// POST   /        -> create (admin)
/// GET    /{id}    -> get_by_id
/// PUT    /{id}    -> update (admin)
/// DELETE /{id}    -> delete (admin, refused while in use)
/// ```
pub fn lookup_router(kind: LookupKind) -> Router<AppState> {
    Router::new()
        .route("/", get(lookups::list).post(lookups::create))
        .route(
            "/{id}",
            get(lookups::get_by_id)
                .put(lookups::update)
                .delete(lookups::delete),
        )
        .layer(Extension(kind))
}

fn status_model_router() -> Router<AppState> {
    Router::new()
        .route("/", get(status_models::list).post(status_models::create))
        .route(
            "/default/{entity_type}",
            get(status_models::get_default),
        )
        .route(
            "/{id}",
            get(status_models::get_by_id)
                .put(status_models::update)
                .delete(status_models::delete),
        )
        .route("/{id}/default", post(status_models::set_default))
        .route("/{id}/statuses", post(status_models::add_status))
        .route(
            "/{id}/statuses/{status_id}",
            put(status_models::update_status).delete(status_models::delete_status),
        )
        .route("/{id}/transitions", post(status_models::add_transition))
        .route(
            "/{id}/transitions/{transition_id}",
            delete(status_models::delete_transition),
        )
}
