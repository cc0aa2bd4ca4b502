//! Unified full-text search across the four primary entity tables.
//!
//! One `UNION ALL` projects epics, user stories, acceptance criteria and
//! requirements onto a common row shape. Acceptance criteria have no
//! title, so their description stands in for it and they carry no
//! status, priority or assignee.
//!
//! Scoring:
//!
//! - exact (case-insensitive) reference-id match scores `1.0`;
//! - otherwise `ts_rank` over the weighted `search_vector` with
//!   normalization 32 (`rank / (rank + 1)`), floored at `0.1` when the
//!   title contains the query as a substring;
//! - an empty query scores every row `0` and relevance ordering falls
//!   back to `created_at`.

use reqhub_core::entity::EntityType;
use reqhub_core::search::{
    build_tsquery, escape_like, SortBy, REFERENCE_MATCH_SCORE, SUBSTRING_MATCH_SCORE,
};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgExecutor, Postgres};

use crate::models::search::{SearchOptions, SearchResultRow};

const SCORED_CTE: &str = "
WITH hits AS (
    SELECT 'epic'::text AS entity_type, id, reference_id, title, description,
           status, priority, creator_id, assignee_id, created_at, updated_at, search_vector
    FROM epics WHERE 'epic' = ANY($1)
    UNION ALL
    SELECT 'user_story'::text, id, reference_id, title, description,
           status, priority, creator_id, assignee_id, created_at, updated_at, search_vector
    FROM user_stories WHERE 'user_story' = ANY($1)
    UNION ALL
    SELECT 'acceptance_criteria'::text, id, reference_id, description, description,
           NULL::text, NULL::smallint, author_id, NULL::uuid, created_at, updated_at, search_vector
    FROM acceptance_criteria WHERE 'acceptance_criteria' = ANY($1)
    UNION ALL
    SELECT 'requirement'::text, id, reference_id, title, description,
           status, priority, creator_id, assignee_id, created_at, updated_at, search_vector
    FROM requirements WHERE 'requirement' = ANY($1)
),
scored AS (
    SELECT h.entity_type, h.id, h.reference_id, h.title, h.description, h.status,
           h.priority, h.created_at, h.updated_at,
           CASE
               WHEN $2::text IS NULL THEN 0::real
               WHEN upper(h.reference_id) = upper($2) THEN $11::real
               ELSE GREATEST(
                   CASE WHEN $3::text IS NOT NULL
                        THEN ts_rank(h.search_vector, to_tsquery('english', $3), 32)
                        ELSE 0::real END,
                   CASE WHEN h.title ILIKE '%' || $4::text || '%'
                        THEN $12::real
                        ELSE 0::real END
               )
           END AS score
    FROM hits h
    WHERE ($2::text IS NULL
           OR upper(h.reference_id) = upper($2)
           OR ($3::text IS NOT NULL AND h.search_vector @@ to_tsquery('english', $3))
           OR h.title ILIKE '%' || $4::text || '%')
      AND ($5::smallint IS NULL OR h.priority = $5)
      AND ($6::text IS NULL OR lower(h.status) = lower($6))
      AND ($7::uuid IS NULL OR h.creator_id = $7)
      AND ($8::uuid IS NULL OR h.assignee_id = $8)
      AND ($9::timestamptz IS NULL OR h.created_at >= $9)
      AND ($10::timestamptz IS NULL OR h.created_at <= $10)
)";

/// Bind values derived once from [`SearchOptions`].
struct SearchParams {
    types: Vec<String>,
    query: Option<String>,
    tsquery: Option<String>,
    like: Option<String>,
}

impl SearchParams {
    fn from_options(options: &SearchOptions) -> Self {
        let query = options.query.clone().filter(|q| !q.trim().is_empty());
        Self {
            types: options
                .entity_types
                .iter()
                .map(|t| EntityType::as_str(t).to_string())
                .collect(),
            tsquery: query.as_deref().and_then(build_tsquery),
            like: query.as_deref().map(escape_like),
            query,
        }
    }
}

fn bind_filters<'q, T>(
    q: QueryAs<'q, Postgres, T, PgArguments>,
    params: &'q SearchParams,
    options: &'q SearchOptions,
) -> QueryAs<'q, Postgres, T, PgArguments> {
    q.bind(&params.types)
        .bind(params.query.as_deref())
        .bind(params.tsquery.as_deref())
        .bind(params.like.as_deref())
        .bind(options.priority)
        .bind(options.status.as_deref())
        .bind(options.creator_id)
        .bind(options.assignee_id)
        .bind(options.created_from)
        .bind(options.created_to)
        .bind(REFERENCE_MATCH_SCORE)
        .bind(SUBSTRING_MATCH_SCORE)
}

fn order_clause(options: &SearchOptions, has_query: bool) -> String {
    let dir = options.sort_order.as_sql();
    match options.sort_by {
        SortBy::Relevance if has_query => {
            format!("ORDER BY score {dir}, created_at DESC, entity_type ASC, id ASC")
        }
        SortBy::Relevance | SortBy::CreatedAt => {
            format!("ORDER BY created_at {dir}, entity_type ASC, id ASC")
        }
        SortBy::UpdatedAt => format!("ORDER BY updated_at {dir}, entity_type ASC, id ASC"),
    }
}

pub struct SearchRepo;

impl SearchRepo {
    /// One page of ranked hits.
    pub async fn search<'e>(
        db: impl PgExecutor<'e>,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResultRow>, sqlx::Error> {
        let params = SearchParams::from_options(options);
        let order = order_clause(options, params.query.is_some());
        let query = format!(
            "{SCORED_CTE}
             SELECT entity_type, id, reference_id, title, description, status, priority,
                    created_at, updated_at, score
             FROM scored
             {order}
             LIMIT $13 OFFSET $14"
        );
        bind_filters(sqlx::query_as::<_, SearchResultRow>(&query), &params, options)
            .bind(options.page.limit)
            .bind(options.page.offset)
            .fetch_all(db)
            .await
    }

    /// Total hits for the same options, ignoring pagination.
    pub async fn count<'e>(
        db: impl PgExecutor<'e>,
        options: &SearchOptions,
    ) -> Result<i64, sqlx::Error> {
        let params = SearchParams::from_options(options);
        let query = format!("{SCORED_CTE} SELECT COUNT(*) FROM scored");
        let (total,): (i64,) = bind_filters(sqlx::query_as(&query), &params, options)
            .fetch_one(db)
            .await?;
        Ok(total)
    }
}
