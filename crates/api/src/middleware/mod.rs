//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- the authenticated principal, from a JWT or a PAT.
//! - [`rbac::RequireAdmin`] -- requires the `Administrator` role.
//! - [`rbac::RequireUser`] -- requires `User` or above.
//! - [`rbac::RequireCommenter`] -- requires any role (`Commenter` or above).

pub mod auth;
pub mod rbac;
