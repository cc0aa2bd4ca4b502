//! Repository for the `epics` table.

use reqhub_core::reference_id::Identifier;
use reqhub_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::epic::{Epic, NewEpic, UpdateEpic};
use crate::models::filter::EntityFilter;

const COLUMNS: &str = "id, reference_id, sequence_number, title, description, priority, \
                       status, creator_id, assignee_id, created_at, updated_at";

/// Shared WHERE clause for list and count; `$1..$4` are nullable filters.
const FILTER_CLAUSE: &str = "($1::text IS NULL OR lower(status) = lower($1))
               AND ($2::smallint IS NULL OR priority = $2)
               AND ($3::uuid IS NULL OR creator_id = $3)
               AND ($4::uuid IS NULL OR assignee_id = $4)";

pub struct EpicRepo;

impl EpicRepo {
    pub async fn insert<'e>(db: impl PgExecutor<'e>, input: &NewEpic) -> Result<Epic, sqlx::Error> {
        let query = format!(
            "INSERT INTO epics
                (id, reference_id, sequence_number, title, description, priority,
                 status, creator_id, assignee_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Epic>(&query)
            .bind(input.id)
            .bind(&input.reference_id)
            .bind(input.sequence_number)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.priority)
            .bind(&input.status)
            .bind(input.creator_id)
            .bind(input.assignee_id)
            .fetch_one(db)
            .await
    }

    pub async fn find_by_id<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Epic>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM epics WHERE id = $1");
        sqlx::query_as::<_, Epic>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_reference<'e>(
        db: impl PgExecutor<'e>,
        reference_id: &str,
    ) -> Result<Option<Epic>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM epics WHERE reference_id = $1");
        sqlx::query_as::<_, Epic>(&query)
            .bind(reference_id)
            .fetch_optional(db)
            .await
    }

    /// Resolve a UUID-or-reference identifier.
    pub async fn find<'e>(
        db: impl PgExecutor<'e>,
        identifier: &Identifier,
    ) -> Result<Option<Epic>, sqlx::Error> {
        match identifier {
            Identifier::Id(id) => Self::find_by_id(db, *id).await,
            Identifier::Reference(r) => Self::find_by_reference(db, r).await,
        }
    }

    /// Page of epics matching `filter`.
    pub async fn list<'e>(
        db: impl PgExecutor<'e>,
        filter: &EntityFilter,
    ) -> Result<Vec<Epic>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM epics
             WHERE {FILTER_CLAUSE}
             {}
             LIMIT $5 OFFSET $6",
            filter.order_clause()
        );
        sqlx::query_as::<_, Epic>(&query)
            .bind(&filter.status)
            .bind(filter.priority)
            .bind(filter.creator_id)
            .bind(filter.assignee_id)
            .bind(filter.page.limit)
            .bind(filter.page.offset)
            .fetch_all(db)
            .await
    }

    /// Total rows matching `filter`, ignoring pagination.
    pub async fn count<'e>(
        db: impl PgExecutor<'e>,
        filter: &EntityFilter,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM epics WHERE {FILTER_CLAUSE}");
        sqlx::query_scalar(&query)
            .bind(&filter.status)
            .bind(filter.priority)
            .bind(filter.creator_id)
            .bind(filter.assignee_id)
            .fetch_one(db)
            .await
    }

    /// Apply a partial update. Returns `None` if the epic does not exist.
    pub async fn update<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        input: &UpdateEpic,
    ) -> Result<Option<Epic>, sqlx::Error> {
        let query = format!(
            "UPDATE epics SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                priority = COALESCE($4, priority)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Epic>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.priority)
            .fetch_optional(db)
            .await
    }

    pub async fn set_status<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        status: &str,
    ) -> Result<Option<Epic>, sqlx::Error> {
        let query = format!("UPDATE epics SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Epic>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(db)
            .await
    }

    /// Set or clear the assignee.
    pub async fn set_assignee<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        assignee_id: Option<DbId>,
    ) -> Result<Option<Epic>, sqlx::Error> {
        let query = format!("UPDATE epics SET assignee_id = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Epic>(&query)
            .bind(id)
            .bind(assignee_id)
            .fetch_optional(db)
            .await
    }

    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM epics WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
