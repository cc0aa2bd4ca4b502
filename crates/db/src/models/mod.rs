//! Row structs and DTOs, one module per table family.

pub mod acceptance_criteria;
pub mod comment;
pub mod epic;
pub mod filter;
pub mod lookup;
pub mod relationship;
pub mod requirement;
pub mod search;
pub mod status_model;
pub mod token;
pub mod user;
pub mod user_story;
