//! Repository for the `relationship_types` lookup table.

use reqhub_core::types::DbId;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::lookup::{CreateLookupType, RelationshipType, UpdateLookupType};

const COLUMNS: &str = "id, name, description, created_at, updated_at";

pub struct RelationshipTypeRepo;

impl RelationshipTypeRepo {
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        input: &CreateLookupType,
    ) -> Result<RelationshipType, sqlx::Error> {
        let query = format!(
            "INSERT INTO relationship_types (id, name, description)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RelationshipType>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(db)
            .await
    }

    pub async fn find_by_id<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<RelationshipType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM relationship_types WHERE id = $1");
        sqlx::query_as::<_, RelationshipType>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Case-insensitive name lookup (`Depends_On` finds `depends_on`).
    pub async fn find_by_name<'e>(
        db: impl PgExecutor<'e>,
        name: &str,
    ) -> Result<Option<RelationshipType>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM relationship_types WHERE lower(name) = lower($1)");
        sqlx::query_as::<_, RelationshipType>(&query)
            .bind(name)
            .fetch_optional(db)
            .await
    }

    pub async fn list<'e>(db: impl PgExecutor<'e>) -> Result<Vec<RelationshipType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM relationship_types ORDER BY name ASC");
        sqlx::query_as::<_, RelationshipType>(&query)
            .fetch_all(db)
            .await
    }

    pub async fn update<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        input: &UpdateLookupType,
    ) -> Result<Option<RelationshipType>, sqlx::Error> {
        let query = format!(
            "UPDATE relationship_types SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RelationshipType>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(db)
            .await
    }

    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM relationship_types WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
