//! Shared query parameter types for API handlers.
//!
//! Common query structs that appear across multiple handler modules are
//! extracted here to avoid duplication.

use reqhub_core::pagination::{parse_sort_order, Page};
use reqhub_core::types::DbId;
use reqhub_db::models::filter::{parse_sort_column, EntityFilter};
use serde::Deserialize;

use crate::error::AppResult;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Out-of-range values are rejected by [`Page::new`] rather than clamped.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    pub fn page(&self) -> AppResult<Page> {
        Ok(Page::new(self.limit, self.offset)?)
    }
}

/// `?force=true` on delete endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ForceParams {
    #[serde(default)]
    pub force: bool,
}

/// Filters, ordering and pagination for Epic, UserStory and Requirement lists.
#[derive(Debug, Default, Deserialize)]
pub struct EntityListParams {
    pub status: Option<String>,
    pub priority: Option<i16>,
    pub creator_id: Option<DbId>,
    pub assignee_id: Option<DbId>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl EntityListParams {
    /// Validate the raw parameters into a repository filter.
    pub fn into_filter(self) -> AppResult<EntityFilter> {
        let priority = self
            .priority
            .map(reqhub_core::entity::validate_priority)
            .transpose()?;
        Ok(EntityFilter {
            status: self.status.filter(|s| !s.trim().is_empty()),
            priority,
            creator_id: self.creator_id,
            assignee_id: self.assignee_id,
            sort_by: parse_sort_column(self.sort_by.as_deref())?,
            sort_order: parse_sort_order(self.sort_order.as_deref())?,
            page: Page::new(self.limit, self.offset)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use reqhub_core::pagination::SortOrder;
    use reqhub_db::models::filter::SortColumn;

    use super::*;

    #[test]
    fn empty_params_use_defaults() {
        let filter = EntityListParams::default().into_filter().unwrap();
        assert_eq!(filter.page, Page::default());
        assert_eq!(filter.sort_by, SortColumn::CreatedAt);
        assert_eq!(filter.sort_order, SortOrder::Desc);
        assert!(filter.status.is_none());
    }

    #[test]
    fn blank_status_is_ignored() {
        let params = EntityListParams {
            status: Some("  ".into()),
            ..Default::default()
        };
        assert!(params.into_filter().unwrap().status.is_none());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_priority = EntityListParams {
            priority: Some(9),
            ..Default::default()
        };
        assert!(bad_priority.into_filter().is_err());

        let bad_sort = EntityListParams {
            sort_by: Some("password_hash".into()),
            ..Default::default()
        };
        assert!(bad_sort.into_filter().is_err());

        let bad_limit = PaginationParams {
            limit: Some(0),
            offset: None,
        };
        assert!(bad_limit.page().is_err());
    }
}
