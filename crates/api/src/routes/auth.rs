//! Route definitions for the `/auth` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{auth, users};
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST   /login              -> login (public)
/// POST   /refresh            -> refresh (public)
/// POST   /logout             -> logout
/// POST   /change-password    -> change_password
/// GET    /profile            -> profile
///
/// POST   /tokens             -> create_token
/// GET    /tokens             -> list_tokens
/// DELETE /tokens/{id}        -> revoke_token
///
/// GET    /users              -> list (admin)
/// POST   /users              -> create (admin)
/// GET    /users/{id}         -> get_by_id (admin)
/// PUT    /users/{id}         -> update (admin)
/// DELETE /users/{id}         -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/change-password", post(auth::change_password))
        .route("/profile", get(auth::profile))
        .route("/tokens", get(auth::list_tokens).post(auth::create_token))
        .route("/tokens/{id}", delete(auth::revoke_token))
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/{id}",
            get(users::get_by_id)
                .put(users::update)
                .delete(users::delete),
        )
}
