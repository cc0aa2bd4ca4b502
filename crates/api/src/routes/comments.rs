//! Route definitions for comments.
//!
//! Two routers are provided:
//! - `entity_router()` for the comment routes of one entity type, merged
//!   into that entity's router
//! - `router()` for comment-id routes mounted at `/comments`

use axum::routing::{get, post};
use axum::{Extension, Router};
use reqhub_core::entity::EntityType;

use crate::handlers::comments;
use crate::state::AppState;

/// Comment routes scoped to `entity`, merged under its resource path.
///
/// ```text
/// GET    /{id}/comments                    -> list_for_entity
/// POST   /{id}/comments                    -> create
/// POST   /{id}/comments/inline             -> create_inline
/// GET    /{id}/comments/inline/visible     -> list_visible_inline
/// POST   /{id}/comments/inline/validate    -> validate_inline
/// ```
pub fn entity_router(entity: EntityType) -> Router<AppState> {
    Router::new()
        .route(
            "/{id}/comments",
            get(comments::list_for_entity).post(comments::create),
        )
        .route("/{id}/comments/inline", post(comments::create_inline))
        .route(
            "/{id}/comments/inline/visible",
            get(comments::list_visible_inline),
        )
        .route(
            "/{id}/comments/inline/validate",
            post(comments::validate_inline),
        )
        .layer(Extension(entity))
}

/// Routes mounted at `/comments`.
///
/// ```text
/// GET    /{id}              -> get_by_id
/// PUT    /{id}              -> update (author or admin)
/// DELETE /{id}              -> delete (author or admin)
/// POST   /{id}/resolve      -> resolve
/// POST   /{id}/unresolve    -> unresolve
/// GET    /{id}/replies      -> replies
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(comments::get_by_id)
                .put(comments::update)
                .delete(comments::delete),
        )
        .route("/{id}/resolve", post(comments::resolve))
        .route("/{id}/unresolve", post(comments::unresolve))
        .route("/{id}/replies", get(comments::replies))
}
