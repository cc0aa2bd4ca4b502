//! Repository for the `requirements` table.

use reqhub_core::reference_id::Identifier;
use reqhub_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::filter::EntityFilter;
use crate::models::requirement::{NewRequirement, Requirement, UpdateRequirement};

const COLUMNS: &str = "id, reference_id, sequence_number, user_story_id, acceptance_criteria_id, \
                       requirement_type_id, title, description, priority, status, creator_id, \
                       assignee_id, created_at, updated_at";

/// `$1` is the optional parent story; `$2..$5` are the entity filters.
const FILTER_CLAUSE: &str = "($1::uuid IS NULL OR user_story_id = $1)
               AND ($2::text IS NULL OR lower(status) = lower($2))
               AND ($3::smallint IS NULL OR priority = $3)
               AND ($4::uuid IS NULL OR creator_id = $4)
               AND ($5::uuid IS NULL OR assignee_id = $5)";

pub struct RequirementRepo;

impl RequirementRepo {
    pub async fn insert<'e>(
        db: impl PgExecutor<'e>,
        input: &NewRequirement,
    ) -> Result<Requirement, sqlx::Error> {
        let query = format!(
            "INSERT INTO requirements
                (id, reference_id, sequence_number, user_story_id, acceptance_criteria_id,
                 requirement_type_id, title, description, priority, status, creator_id,
                 assignee_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Requirement>(&query)
            .bind(input.id)
            .bind(&input.reference_id)
            .bind(input.sequence_number)
            .bind(input.user_story_id)
            .bind(input.acceptance_criteria_id)
            .bind(input.requirement_type_id)
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
    ) -> Result<Option<Requirement>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM requirements WHERE id = $1");
        sqlx::query_as::<_, Requirement>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find<'e>(
        db: impl PgExecutor<'e>,
        identifier: &Identifier,
    ) -> Result<Option<Requirement>, sqlx::Error> {
        match identifier {
            Identifier::Id(id) => Self::find_by_id(db, *id).await,
            Identifier::Reference(r) => {
                let query = format!("SELECT {COLUMNS} FROM requirements WHERE reference_id = $1");
                sqlx::query_as::<_, Requirement>(&query)
                    .bind(r)
                    .fetch_optional(db)
                    .await
            }
        }
    }

    pub async fn list<'e>(
        db: impl PgExecutor<'e>,
        user_story_id: Option<DbId>,
        filter: &EntityFilter,
    ) -> Result<Vec<Requirement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM requirements
             WHERE {FILTER_CLAUSE}
             {}
             LIMIT $6 OFFSET $7",
            filter.order_clause()
        );
        sqlx::query_as::<_, Requirement>(&query)
            .bind(user_story_id)
            .bind(&filter.status)
            .bind(filter.priority)
            .bind(filter.creator_id)
            .bind(filter.assignee_id)
            .bind(filter.page.limit)
            .bind(filter.page.offset)
            .fetch_all(db)
            .await
    }

    pub async fn count<'e>(
        db: impl PgExecutor<'e>,
        user_story_id: Option<DbId>,
        filter: &EntityFilter,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM requirements WHERE {FILTER_CLAUSE}");
        sqlx::query_scalar(&query)
            .bind(user_story_id)
            .bind(&filter.status)
            .bind(filter.priority)
            .bind(filter.creator_id)
            .bind(filter.assignee_id)
            .fetch_one(db)
            .await
    }

    pub async fn list_all_for_story<'e>(
        db: impl PgExecutor<'e>,
        user_story_id: DbId,
    ) -> Result<Vec<Requirement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM requirements
             WHERE user_story_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Requirement>(&query)
            .bind(user_story_id)
            .fetch_all(db)
            .await
    }

    pub async fn count_for_story<'e>(
        db: impl PgExecutor<'e>,
        user_story_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM requirements WHERE user_story_id = $1")
            .bind(user_story_id)
            .fetch_one(db)
            .await
    }

    /// Number of requirements pointing at an acceptance criterion.
    pub async fn count_for_acceptance_criteria<'e>(
        db: impl PgExecutor<'e>,
        acceptance_criteria_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM requirements WHERE acceptance_criteria_id = $1")
            .bind(acceptance_criteria_id)
            .fetch_one(db)
            .await
    }

    /// Null out back-references to an acceptance criterion.
    pub async fn clear_acceptance_criteria<'e>(
        db: impl PgExecutor<'e>,
        acceptance_criteria_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE requirements SET acceptance_criteria_id = NULL WHERE acceptance_criteria_id = $1",
        )
        .bind(acceptance_criteria_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn update<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        input: &UpdateRequirement,
    ) -> Result<Option<Requirement>, sqlx::Error> {
        let query = format!(
            "UPDATE requirements SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                priority = COALESCE($4, priority),
                requirement_type_id = COALESCE($5, requirement_type_id),
                acceptance_criteria_id = CASE WHEN $6::boolean THEN $7::uuid ELSE acceptance_criteria_id END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Requirement>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.priority)
            .bind(input.requirement_type_id)
            .bind(input.acceptance_criteria_id.is_some())
            .bind(input.acceptance_criteria_id.flatten())
            .fetch_optional(db)
            .await
    }

    pub async fn set_status<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        status: &str,
    ) -> Result<Option<Requirement>, sqlx::Error> {
        let query =
            format!("UPDATE requirements SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Requirement>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(db)
            .await
    }

    pub async fn set_assignee<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        assignee_id: Option<DbId>,
    ) -> Result<Option<Requirement>, sqlx::Error> {
        let query =
            format!("UPDATE requirements SET assignee_id = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Requirement>(&query)
            .bind(id)
            .bind(assignee_id)
            .fetch_optional(db)
            .await
    }

    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM requirements WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
