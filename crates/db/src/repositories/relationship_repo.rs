//! Repository for the `requirement_relationships` table.

use reqhub_core::pagination::Page;
use reqhub_core::types::DbId;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::relationship::{NewRelationship, RelationshipView, RequirementRelationship};

const COLUMNS: &str = "id, source_requirement_id, target_requirement_id, relationship_type_id, \
                       created_by, created_at, updated_at";

const VIEW_SELECT: &str = "\
    SELECT rr.id, rr.source_requirement_id, src.reference_id AS source_reference_id, \
           rr.target_requirement_id, tgt.reference_id AS target_reference_id, \
           rr.relationship_type_id, rt.name AS relationship_type, \
           rr.created_by, rr.created_at \
    FROM requirement_relationships rr \
    JOIN requirements src ON src.id = rr.source_requirement_id \
    JOIN requirements tgt ON tgt.id = rr.target_requirement_id \
    JOIN relationship_types rt ON rt.id = rr.relationship_type_id";

pub struct RelationshipRepo;

impl RelationshipRepo {
    /// Insert an edge. Self-loops and duplicate triplets are rejected by
    /// `ck_requirement_relationships_no_self_loop` and
    /// `uq_requirement_relationships_triplet`.
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        input: &NewRelationship,
    ) -> Result<RequirementRelationship, sqlx::Error> {
        let query = format!(
            "INSERT INTO requirement_relationships
                (id, source_requirement_id, target_requirement_id, relationship_type_id, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RequirementRelationship>(&query)
            .bind(Uuid::new_v4())
            .bind(input.source_requirement_id)
            .bind(input.target_requirement_id)
            .bind(input.relationship_type_id)
            .bind(input.created_by)
            .fetch_one(db)
            .await
    }

    pub async fn find_view<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<RelationshipView>, sqlx::Error> {
        let query = format!("{VIEW_SELECT} WHERE rr.id = $1");
        sqlx::query_as::<_, RelationshipView>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Page of edges where the requirement is source or target, newest first.
    pub async fn list_for_requirement<'e>(
        db: impl PgExecutor<'e>,
        requirement_id: DbId,
        page: Page,
    ) -> Result<Vec<RelationshipView>, sqlx::Error> {
        let query = format!(
            "{VIEW_SELECT}
             WHERE rr.source_requirement_id = $1 OR rr.target_requirement_id = $1
             ORDER BY rr.created_at DESC, rr.id ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, RelationshipView>(&query)
            .bind(requirement_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(db)
            .await
    }

    pub async fn count_for_requirement<'e>(
        db: impl PgExecutor<'e>,
        requirement_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM requirement_relationships
             WHERE source_requirement_id = $1 OR target_requirement_id = $1",
        )
        .bind(requirement_id)
        .fetch_one(db)
        .await
    }

    /// Number of edges touching any requirement of a story.
    pub async fn count_for_story<'e>(
        db: impl PgExecutor<'e>,
        user_story_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM requirement_relationships rr
             WHERE rr.source_requirement_id IN (SELECT id FROM requirements WHERE user_story_id = $1)
                OR rr.target_requirement_id IN (SELECT id FROM requirements WHERE user_story_id = $1)",
        )
        .bind(user_story_id)
        .fetch_one(db)
        .await
    }

    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM requirement_relationships WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every edge touching any of `requirement_ids`.
    pub async fn delete_for_requirements<'e>(
        db: impl PgExecutor<'e>,
        requirement_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM requirement_relationships
             WHERE source_requirement_id = ANY($1) OR target_requirement_id = ANY($1)",
        )
        .bind(requirement_ids)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    /// Number of edges labelled with a relationship type.
    pub async fn count_for_type<'e>(
        db: impl PgExecutor<'e>,
        relationship_type_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM requirement_relationships WHERE relationship_type_id = $1",
        )
        .bind(relationship_type_id)
        .fetch_one(db)
        .await
    }
}
