//! Pagination bounds shared by every list endpoint and by search.

use serde::Serialize;

use crate::error::CoreError;

/// Default number of rows per page.
pub const DEFAULT_LIMIT: i64 = 25;

/// Maximum number of rows per page.
pub const MAX_LIMIT: i64 = 100;

/// A validated `(limit, offset)` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Page {
    /// Validate user-supplied pagination. Out-of-range values are rejected
    /// rather than clamped so clients notice their mistake.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, CoreError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(CoreError::Validation(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        let offset = offset.unwrap_or(0);
        if offset < 0 {
            return Err(CoreError::Validation(format!(
                "offset must be non-negative, got {offset}"
            )));
        }
        Ok(Self { limit, offset })
    }
}

/// Sort direction for list and search endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    /// SQL keyword. Only ever interpolated from this closed set.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Parse an optional `sort_order` query value.
pub fn parse_sort_order(value: Option<&str>) -> Result<SortOrder, CoreError> {
    match value {
        None => Ok(SortOrder::default()),
        Some(v) => SortOrder::parse(v).ok_or_else(|| {
            CoreError::Validation(format!("sort_order must be 'asc' or 'desc', got '{v}'"))
        }),
    }
}
