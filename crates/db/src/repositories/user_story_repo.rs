//! Repository for the `user_stories` table.

use reqhub_core::reference_id::Identifier;
use reqhub_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::filter::EntityFilter;
use crate::models::user_story::{NewUserStory, UpdateUserStory, UserStory};

const COLUMNS: &str = "id, reference_id, sequence_number, epic_id, title, description, \
                       priority, status, creator_id, assignee_id, created_at, updated_at";

/// `$1` is the optional parent epic; `$2..$5` are the entity filters.
const FILTER_CLAUSE: &str = "($1::uuid IS NULL OR epic_id = $1)
               AND ($2::text IS NULL OR lower(status) = lower($2))
               AND ($3::smallint IS NULL OR priority = $3)
               AND ($4::uuid IS NULL OR creator_id = $4)
               AND ($5::uuid IS NULL OR assignee_id = $5)";

pub struct UserStoryRepo;

impl UserStoryRepo {
    pub async fn insert<'e>(
        db: impl PgExecutor<'e>,
        input: &NewUserStory,
    ) -> Result<UserStory, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_stories
                (id, reference_id, sequence_number, epic_id, title, description,
                 priority, status, creator_id, assignee_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserStory>(&query)
            .bind(input.id)
            .bind(&input.reference_id)
            .bind(input.sequence_number)
            .bind(input.epic_id)
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
    ) -> Result<Option<UserStory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_stories WHERE id = $1");
        sqlx::query_as::<_, UserStory>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find<'e>(
        db: impl PgExecutor<'e>,
        identifier: &Identifier,
    ) -> Result<Option<UserStory>, sqlx::Error> {
        match identifier {
            Identifier::Id(id) => Self::find_by_id(db, *id).await,
            Identifier::Reference(r) => {
                let query = format!("SELECT {COLUMNS} FROM user_stories WHERE reference_id = $1");
                sqlx::query_as::<_, UserStory>(&query)
                    .bind(r)
                    .fetch_optional(db)
                    .await
            }
        }
    }

    /// Page of stories, optionally restricted to one epic.
    pub async fn list<'e>(
        db: impl PgExecutor<'e>,
        epic_id: Option<DbId>,
        filter: &EntityFilter,
    ) -> Result<Vec<UserStory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_stories
             WHERE {FILTER_CLAUSE}
             {}
             LIMIT $6 OFFSET $7",
            filter.order_clause()
        );
        sqlx::query_as::<_, UserStory>(&query)
            .bind(epic_id)
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
        epic_id: Option<DbId>,
        filter: &EntityFilter,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM user_stories WHERE {FILTER_CLAUSE}");
        sqlx::query_scalar(&query)
            .bind(epic_id)
            .bind(&filter.status)
            .bind(filter.priority)
            .bind(filter.creator_id)
            .bind(filter.assignee_id)
            .fetch_one(db)
            .await
    }

    /// Every story of an epic, oldest first (hierarchy and cascade use).
    pub async fn list_all_for_epic<'e>(
        db: impl PgExecutor<'e>,
        epic_id: DbId,
    ) -> Result<Vec<UserStory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_stories WHERE epic_id = $1 ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, UserStory>(&query)
            .bind(epic_id)
            .fetch_all(db)
            .await
    }

    pub async fn count_for_epic<'e>(
        db: impl PgExecutor<'e>,
        epic_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM user_stories WHERE epic_id = $1")
            .bind(epic_id)
            .fetch_one(db)
            .await
    }

    pub async fn update<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        input: &UpdateUserStory,
    ) -> Result<Option<UserStory>, sqlx::Error> {
        let query = format!(
            "UPDATE user_stories SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                priority = COALESCE($4, priority)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserStory>(&query)
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
    ) -> Result<Option<UserStory>, sqlx::Error> {
        let query =
            format!("UPDATE user_stories SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, UserStory>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(db)
            .await
    }

    pub async fn set_assignee<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        assignee_id: Option<DbId>,
    ) -> Result<Option<UserStory>, sqlx::Error> {
        let query =
            format!("UPDATE user_stories SET assignee_id = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, UserStory>(&query)
            .bind(id)
            .bind(assignee_id)
            .fetch_optional(db)
            .await
    }

    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_stories WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
