//! Repository for the `requirement_types` lookup table.

use reqhub_core::types::DbId;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::lookup::{CreateLookupType, RequirementType, UpdateLookupType};

const COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Name of the type assigned when a requirement is created without one.
pub const DEFAULT_REQUIREMENT_TYPE: &str = "Functional";

pub struct RequirementTypeRepo;

impl RequirementTypeRepo {
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        input: &CreateLookupType,
    ) -> Result<RequirementType, sqlx::Error> {
        let query = format!(
            "INSERT INTO requirement_types (id, name, description)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RequirementType>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(db)
            .await
    }

    pub async fn find_by_id<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<RequirementType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM requirement_types WHERE id = $1");
        sqlx::query_as::<_, RequirementType>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_name<'e>(
        db: impl PgExecutor<'e>,
        name: &str,
    ) -> Result<Option<RequirementType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM requirement_types WHERE name = $1");
        sqlx::query_as::<_, RequirementType>(&query)
            .bind(name)
            .fetch_optional(db)
            .await
    }

    pub async fn list<'e>(db: impl PgExecutor<'e>) -> Result<Vec<RequirementType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM requirement_types ORDER BY name ASC");
        sqlx::query_as::<_, RequirementType>(&query)
            .fetch_all(db)
            .await
    }

    pub async fn update<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        input: &UpdateLookupType,
    ) -> Result<Option<RequirementType>, sqlx::Error> {
        let query = format!(
            "UPDATE requirement_types SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RequirementType>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(db)
            .await
    }

    /// Number of requirements of this type.
    pub async fn usage_count<'e>(db: impl PgExecutor<'e>, id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM requirements WHERE requirement_type_id = $1")
            .bind(id)
            .fetch_one(db)
            .await
    }

    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM requirement_types WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
