//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- signed access tokens and their configuration.

pub mod jwt;
pub mod password;
