//! Shared response envelope types for API handlers.
//!
//! Single resources are returned bare. Collections use either the plain
//! `{ "data": ... }` envelope or, when paginated, [`PaginatedResponse`].

use reqhub_core::pagination::Page;
use serde::Serialize;

/// Standard `{ "data": T }` response envelope for unpaginated collections.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": [...], "total_count": N, "limit": L, "offset": O }`.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub total_count: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total_count: i64, page: Page) -> Self {
        Self {
            data,
            total_count,
            limit: page.limit,
            offset: page.offset,
        }
    }
}
