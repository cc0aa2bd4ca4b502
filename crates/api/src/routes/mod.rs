pub mod acceptance_criteria;
pub mod auth;
pub mod comments;
pub mod config;
pub mod epics;
pub mod health;
pub mod requirements;
pub mod search;
pub mod user_stories;

use axum::routing::post;
use axum::Router;

use crate::rpc;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      login (public)
/// /auth/refresh                                    refresh (public)
/// /auth/logout                                     logout
/// /auth/change-password                            change own password
/// /auth/profile                                    current principal
/// /auth/tokens, /auth/tokens/{id}                  personal access tokens
/// /auth/users, /auth/users/{id}                    user management (admin only)
///
/// /epics                                           list, create
/// /epics/{id}                                      get, update, delete
/// /epics/{id}/status, /assign                      status change, assignment
/// /epics/{id}/hierarchy                            nested stories, ACs, requirements
/// /epics/{id}/user-stories                         list, create
///
/// /user-stories                                    list, create
/// /user-stories/{id}                               get, update, delete
/// /user-stories/{id}/status, /assign               status change, assignment
/// /user-stories/{id}/acceptance-criteria           list, create
/// /user-stories/{id}/requirements                  list, create
///
/// /acceptance-criteria                             create
/// /acceptance-criteria/{id}                        get, update, delete
///
/// /requirements                                    list, create
/// /requirements/{id}                               get, update, delete
/// /requirements/{id}/status, /assign               status change, assignment
/// /requirements/{id}/relationships                 list (both directions)
/// /requirements/relationships                      create
/// /requirements/relationships/{id}                 delete
///
/// /{entity}/{id}/comments                          list, create
/// /{entity}/{id}/comments/inline                   create inline
/// /{entity}/{id}/comments/inline/visible           anchored inline comments
/// /{entity}/{id}/comments/inline/validate          anchor dry run
/// /comments/{id}                                   get, update, delete
/// /comments/{id}/resolve, /unresolve               resolution state
/// /comments/{id}/replies                           direct replies
///
/// /search                                          cross-entity search
///
/// /config/requirement-types[/{id}]                 lookup CRUD (writes admin only)
/// /config/relationship-types[/{id}]                lookup CRUD (writes admin only)
/// /config/status-models[/...]                      workflow config (writes admin only)
///
/// /mcp                                             JSON-RPC 2.0 tool endpoint
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication, personal access tokens and user management.
        .nest("/auth", auth::router())
        // Primary entities; each also carries its comment routes.
        .nest("/epics", epics::router())
        .nest("/user-stories", user_stories::router())
        .nest("/acceptance-criteria", acceptance_criteria::router())
        .nest("/requirements", requirements::router())
        // Comment-id routes (threads, resolution, author edits).
        .nest("/comments", comments::router())
        // Cross-entity search.
        .nest("/search", search::router())
        // Requirement/relationship types and status models.
        .nest("/config", config::router())
        // JSON-RPC tool surface for agent clients.
        .route("/mcp", post(rpc::handle))
}
