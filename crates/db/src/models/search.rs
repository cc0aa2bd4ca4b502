//! Search options and result rows.

use reqhub_core::entity::EntityType;
use reqhub_core::pagination::{Page, SortOrder};
use reqhub_core::search::SortBy;
use reqhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Validated search options.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Trimmed free text; `None` lists everything matching the filters.
    pub query: Option<String>,
    pub entity_types: Vec<EntityType>,
    pub priority: Option<i16>,
    pub status: Option<String>,
    pub creator_id: Option<DbId>,
    pub assignee_id: Option<DbId>,
    pub created_from: Option<Timestamp>,
    pub created_to: Option<Timestamp>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: Page,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            query: None,
            entity_types: EntityType::ALL.to_vec(),
            priority: None,
            status: None,
            creator_id: None,
            assignee_id: None,
            created_from: None,
            created_to: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            page: Page::default(),
        }
    }
}

/// One hit from the unified search.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SearchResultRow {
    pub entity_type: String,
    pub id: DbId,
    pub reference_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<i16>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub score: f32,
}
