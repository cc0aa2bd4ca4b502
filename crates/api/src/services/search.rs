//! Cross-entity search.

use chrono::NaiveDate;
use reqhub_core::entity::{truncate_description, validate_priority};
use reqhub_core::error::CoreError;
use reqhub_core::pagination::{parse_sort_order, Page};
use reqhub_core::search::{normalize_score, parse_entity_types, SortBy, RESULT_DESCRIPTION_LENGTH};
use reqhub_core::types::{DbId, Timestamp};
use reqhub_db::models::search::{SearchOptions, SearchResultRow};
use reqhub_db::repositories::SearchRepo;
use reqhub_db::DbPool;
use serde::{Deserialize, Serialize};

use super::non_blank;
use crate::error::AppResult;

/// Raw `GET /search` parameters, also accepted as tool arguments.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(alias = "query")]
    pub q: Option<String>,
    /// Comma-separated entity type tags.
    #[serde(rename = "type", alias = "entity_types")]
    pub entity_types: Option<String>,
    pub priority: Option<i16>,
    pub status: Option<String>,
    pub creator_id: Option<DbId>,
    pub assignee_id: Option<DbId>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    pub created_from: Option<String>,
    pub created_to: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One search hit as returned to clients.
#[derive(Debug, Serialize)]
pub struct SearchResult {
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

impl From<SearchResultRow> for SearchResult {
    fn from(row: SearchResultRow) -> Self {
        Self {
            entity_type: row.entity_type,
            id: row.id,
            reference_id: row.reference_id,
            title: row.title,
            description: row
                .description
                .map(|d| truncate_description(&d, RESULT_DESCRIPTION_LENGTH)),
            status: row.status,
            priority: row.priority,
            created_at: row.created_at,
            updated_at: row.updated_at,
            score: normalize_score(row.score),
        }
    }
}

/// Parse a date bound. A bare date on the upper bound covers the whole day.
fn parse_bound(field: &str, raw: &str, end_of_day: bool) -> AppResult<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&chrono::Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        CoreError::Validation(format!(
            "{field} must be an RFC 3339 timestamp or a YYYY-MM-DD date"
        ))
    })?;
    let time = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc())
        .ok_or_else(|| CoreError::Validation(format!("{field} is out of range")).into())
}

impl SearchParams {
    pub fn into_options(self) -> AppResult<SearchOptions> {
        let sort_by = match non_blank(self.sort_by) {
            Some(raw) => SortBy::parse(raw.trim()).ok_or_else(|| {
                CoreError::Validation(format!(
                    "sort_by must be relevance, created_at or updated_at, got '{raw}'"
                ))
            })?,
            None => SortBy::default(),
        };
        let created_from = self
            .created_from
            .as_deref()
            .map(|raw| parse_bound("created_from", raw, false))
            .transpose()?;
        let created_to = self
            .created_to
            .as_deref()
            .map(|raw| parse_bound("created_to", raw, true))
            .transpose()?;

        Ok(SearchOptions {
            query: non_blank(self.q).map(|q| q.trim().to_string()),
            entity_types: parse_entity_types(self.entity_types.as_deref())?,
            priority: self.priority.map(validate_priority).transpose()?,
            status: non_blank(self.status),
            creator_id: self.creator_id,
            assignee_id: self.assignee_id,
            created_from,
            created_to,
            sort_by,
            sort_order: parse_sort_order(self.sort_order.as_deref())?,
            page: Page::new(self.limit, self.offset)?,
        })
    }
}

pub async fn search(pool: &DbPool, options: &SearchOptions) -> AppResult<(Vec<SearchResult>, i64)> {
    let rows = SearchRepo::search(pool, options).await?;
    let total = SearchRepo::count(pool, options).await?;
    tracing::debug!(
        query = ?options.query,
        hits = rows.len(),
        total,
        "Search executed"
    );
    Ok((rows.into_iter().map(SearchResult::from).collect(), total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::error::AppError;

    #[test]
    fn defaults_select_everything() {
        let options = SearchParams::default().into_options().unwrap();
        assert!(options.query.is_none());
        assert_eq!(options.entity_types.len(), 4);
        assert_eq!(options.sort_by, SortBy::Relevance);
        assert_eq!(options.page, Page::default());
    }

    #[test]
    fn blank_query_is_absent() {
        let params = SearchParams {
            q: Some("   ".into()),
            ..Default::default()
        };
        assert!(params.into_options().unwrap().query.is_none());
    }

    #[test]
    fn date_bounds_accept_dates_and_timestamps() {
        let params = SearchParams {
            created_from: Some("2026-01-01".into()),
            created_to: Some("2026-01-31T12:00:00Z".into()),
            ..Default::default()
        };
        let options = params.into_options().unwrap();
        assert_eq!(options.created_from.unwrap().to_rfc3339(), "2026-01-01T00:00:00+00:00");
        assert_eq!(options.created_to.unwrap().to_rfc3339(), "2026-01-31T12:00:00+00:00");
    }

    #[test]
    fn invalid_options_are_validation_errors() {
        let bad_sort = SearchParams {
            sort_by: Some("title".into()),
            ..Default::default()
        };
        assert_matches!(bad_sort.into_options(), Err(AppError::Core(CoreError::Validation(_))));

        let bad_type = SearchParams {
            entity_types: Some("epic,widget".into()),
            ..Default::default()
        };
        assert_matches!(bad_type.into_options(), Err(AppError::Core(CoreError::Validation(_))));

        let bad_limit = SearchParams {
            limit: Some(0),
            ..Default::default()
        };
        assert!(bad_limit.into_options().is_err());

        let bad_date = SearchParams {
            created_from: Some("yesterday".into()),
            ..Default::default()
        };
        assert!(bad_date.into_options().is_err());
    }
}
