//! Filtering and ordering shared by the primary-entity list queries.

use reqhub_core::error::CoreError;
use reqhub_core::pagination::{Page, SortOrder};
use reqhub_core::types::DbId;

/// Whitelisted ORDER BY column for entity listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    CreatedAt,
    UpdatedAt,
    Priority,
    Title,
    Status,
    ReferenceId,
}

impl SortColumn {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created_at" => Some(Self::CreatedAt),
            "updated_at" => Some(Self::UpdatedAt),
            "priority" => Some(Self::Priority),
            "title" => Some(Self::Title),
            "status" => Some(Self::Status),
            "reference_id" => Some(Self::ReferenceId),
            _ => None,
        }
    }

    /// Column name. Only ever interpolated from this closed set.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Priority => "priority",
            Self::Title => "title",
            Self::Status => "status",
            Self::ReferenceId => "reference_id",
        }
    }
}

/// Parse an optional `sort_by` query value.
pub fn parse_sort_column(value: Option<&str>) -> Result<SortColumn, CoreError> {
    match value {
        None => Ok(SortColumn::default()),
        Some(v) => SortColumn::parse(v).ok_or_else(|| {
            CoreError::Validation(format!(
                "sort_by must be one of created_at, updated_at, priority, title, status, reference_id; got '{v}'"
            ))
        }),
    }
}

/// Structured filters for Epic, UserStory and Requirement listings.
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    /// Matched case-insensitively.
    pub status: Option<String>,
    pub priority: Option<i16>,
    pub creator_id: Option<DbId>,
    pub assignee_id: Option<DbId>,
    pub sort_by: SortColumn,
    pub sort_order: SortOrder,
    pub page: Page,
}

impl EntityFilter {
    /// `ORDER BY` clause with a deterministic tie-breaker.
    pub fn order_clause(&self) -> String {
        format!(
            "ORDER BY {} {}, id ASC",
            self.sort_by.as_sql(),
            self.sort_order.as_sql()
        )
    }
}
