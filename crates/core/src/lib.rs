//! Domain rules for the requirements hub.
//!
//! Everything in this crate is pure: no database, no HTTP. The `db` and
//! `api` crates depend on it for identifiers, validation, workflow rules,
//! inline-comment anchoring, search helpers and token material.

pub mod comments;
pub mod entity;
pub mod error;
pub mod hashing;
pub mod pagination;
pub mod reference_id;
pub mod roles;
pub mod search;
pub mod tokens;
pub mod types;
pub mod user_story;
pub mod workflow;
