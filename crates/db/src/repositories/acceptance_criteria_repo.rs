//! Repository for the `acceptance_criteria` table.

use reqhub_core::pagination::Page;
use reqhub_core::reference_id::Identifier;
use reqhub_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::acceptance_criteria::{AcceptanceCriteria, NewAcceptanceCriteria};

const COLUMNS: &str = "id, reference_id, sequence_number, user_story_id, description, \
                       author_id, created_at, updated_at";

pub struct AcceptanceCriteriaRepo;

impl AcceptanceCriteriaRepo {
    pub async fn insert<'e>(
        db: impl PgExecutor<'e>,
        input: &NewAcceptanceCriteria,
    ) -> Result<AcceptanceCriteria, sqlx::Error> {
        let query = format!(
            "INSERT INTO acceptance_criteria
                (id, reference_id, sequence_number, user_story_id, description, author_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AcceptanceCriteria>(&query)
            .bind(input.id)
            .bind(&input.reference_id)
            .bind(input.sequence_number)
            .bind(input.user_story_id)
            .bind(&input.description)
            .bind(input.author_id)
            .fetch_one(db)
            .await
    }

    pub async fn find_by_id<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<AcceptanceCriteria>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM acceptance_criteria WHERE id = $1");
        sqlx::query_as::<_, AcceptanceCriteria>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find<'e>(
        db: impl PgExecutor<'e>,
        identifier: &Identifier,
    ) -> Result<Option<AcceptanceCriteria>, sqlx::Error> {
        match identifier {
            Identifier::Id(id) => Self::find_by_id(db, *id).await,
            Identifier::Reference(r) => {
                let query =
                    format!("SELECT {COLUMNS} FROM acceptance_criteria WHERE reference_id = $1");
                sqlx::query_as::<_, AcceptanceCriteria>(&query)
                    .bind(r)
                    .fetch_optional(db)
                    .await
            }
        }
    }

    /// Page of a story's criteria in creation order.
    pub async fn list_for_story<'e>(
        db: impl PgExecutor<'e>,
        user_story_id: DbId,
        page: Page,
    ) -> Result<Vec<AcceptanceCriteria>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM acceptance_criteria
             WHERE user_story_id = $1
             ORDER BY created_at ASC, id ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, AcceptanceCriteria>(&query)
            .bind(user_story_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(db)
            .await
    }

    pub async fn list_all_for_story<'e>(
        db: impl PgExecutor<'e>,
        user_story_id: DbId,
    ) -> Result<Vec<AcceptanceCriteria>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM acceptance_criteria
             WHERE user_story_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, AcceptanceCriteria>(&query)
            .bind(user_story_id)
            .fetch_all(db)
            .await
    }

    pub async fn count_for_story<'e>(
        db: impl PgExecutor<'e>,
        user_story_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM acceptance_criteria WHERE user_story_id = $1")
            .bind(user_story_id)
            .fetch_one(db)
            .await
    }

    pub async fn update_description<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        description: &str,
    ) -> Result<Option<AcceptanceCriteria>, sqlx::Error> {
        let query = format!(
            "UPDATE acceptance_criteria SET description = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AcceptanceCriteria>(&query)
            .bind(id)
            .bind(description)
            .fetch_optional(db)
            .await
    }

    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM acceptance_criteria WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
