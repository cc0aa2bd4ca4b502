//! Repository for the `comments` table.

use reqhub_core::entity::EntityType;
use reqhub_core::pagination::Page;
use reqhub_core::types::DbId;
use sqlx::PgExecutor;

use super::reference_id_repo::table_for;
use crate::models::comment::{Comment, CommentFilter, NewComment};

const COLUMNS: &str = "id, entity_type, entity_id, author_id, content, parent_comment_id, \
    is_resolved, is_hidden, linked_text, start_offset, end_offset, created_at, updated_at";

/// Shared `WHERE` clause for entity listings. Binds `$1..$6`.
const ENTITY_FILTER_CLAUSE: &str = "entity_type = $1 AND entity_id = $2 \
    AND ($3::boolean IS NULL OR (linked_text IS NOT NULL) = $3) \
    AND ($4::boolean IS NULL OR is_resolved = $4) \
    AND (NOT $5 OR NOT is_hidden) \
    AND (NOT $6 OR parent_comment_id IS NULL)";

pub struct CommentRepo;

impl CommentRepo {
    pub async fn insert<'e>(
        db: impl PgExecutor<'e>,
        input: &NewComment,
    ) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments
                (id, entity_type, entity_id, author_id, content, parent_comment_id,
                 linked_text, start_offset, end_offset)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        let anchor = input.anchor.as_ref();
        sqlx::query_as::<_, Comment>(&query)
            .bind(input.id)
            .bind(&input.entity_type)
            .bind(input.entity_id)
            .bind(input.author_id)
            .bind(&input.content)
            .bind(input.parent_comment_id)
            .bind(anchor.map(|a| a.linked_text.as_str()))
            .bind(anchor.map(|a| a.start_offset))
            .bind(anchor.map(|a| a.end_offset))
            .fetch_one(db)
            .await
    }

    pub async fn find_by_id<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Comments on one entity, oldest first.
    pub async fn list_for_entity<'e>(
        db: impl PgExecutor<'e>,
        entity_type: &str,
        entity_id: DbId,
        filter: &CommentFilter,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM comments
             WHERE {ENTITY_FILTER_CLAUSE}
             ORDER BY created_at ASC, id ASC
             LIMIT $7 OFFSET $8"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .bind(filter.inline)
            .bind(filter.is_resolved)
            .bind(filter.visible_only)
            .bind(filter.roots_only)
            .bind(filter.page.map(|p| p.limit))
            .bind(filter.page.map_or(0, |p| p.offset))
            .fetch_all(db)
            .await
    }

    /// Comments on one entity matching `filter`, ignoring pagination.
    pub async fn count_for_entity<'e>(
        db: impl PgExecutor<'e>,
        entity_type: &str,
        entity_id: DbId,
        filter: &CommentFilter,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM comments WHERE {ENTITY_FILTER_CLAUSE}");
        sqlx::query_scalar(&query)
            .bind(entity_type)
            .bind(entity_id)
            .bind(filter.inline)
            .bind(filter.is_resolved)
            .bind(filter.visible_only)
            .bind(filter.roots_only)
            .fetch_one(db)
            .await
    }

    /// Page of direct replies to a comment, oldest first.
    pub async fn list_replies<'e>(
        db: impl PgExecutor<'e>,
        parent_id: DbId,
        page: Page,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM comments
             WHERE parent_comment_id = $1
             ORDER BY created_at ASC, id ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(parent_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(db)
            .await
    }

    pub async fn count_replies<'e>(
        db: impl PgExecutor<'e>,
        parent_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE parent_comment_id = $1")
            .bind(parent_id)
            .fetch_one(db)
            .await
    }

    /// Every inline comment on an entity, hidden ones included, locked for
    /// anchor revalidation.
    pub async fn list_inline_for_update<'e>(
        db: impl PgExecutor<'e>,
        entity_type: &str,
        entity_id: DbId,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM comments
             WHERE entity_type = $1 AND entity_id = $2 AND linked_text IS NOT NULL
             ORDER BY created_at ASC, id ASC
             FOR UPDATE"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_all(db)
            .await
    }

    pub async fn update_content<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        content: &str,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!(
            "UPDATE comments SET content = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(content)
            .fetch_optional(db)
            .await
    }

    /// Set the resolved flag. Setting the current value again is a no-op.
    pub async fn set_resolved<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        resolved: bool,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!(
            "UPDATE comments SET is_resolved = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(resolved)
            .fetch_optional(db)
            .await
    }

    /// Store the outcome of anchor revalidation.
    ///
    /// Offsets are only moved when the anchor was found; a hidden comment
    /// keeps its last good range.
    pub async fn update_anchor<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        offsets: Option<(i32, i32)>,
        is_hidden: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE comments SET
                start_offset = COALESCE($2, start_offset),
                end_offset = COALESCE($3, end_offset),
                is_hidden = $4
             WHERE id = $1",
        )
        .bind(id)
        .bind(offsets.map(|(start, _)| start))
        .bind(offsets.map(|(_, end)| end))
        .bind(is_hidden)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Delete a comment; its replies cascade.
    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every comment on the given entities.
    pub async fn delete_for_entities<'e>(
        db: impl PgExecutor<'e>,
        entity_type: &str,
        entity_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM comments WHERE entity_type = $1 AND entity_id = ANY($2)")
                .bind(entity_type)
                .bind(entity_ids)
                .execute(db)
                .await?;
        Ok(result.rows_affected())
    }

    /// Lock the commented entity's row and return its description.
    ///
    /// `None` when the entity does not exist; `Some(None)` when it has no
    /// description. Inline comment creation holds this lock so a concurrent
    /// description edit cannot slip between anchor validation and insert.
    pub async fn lock_subject<'e>(
        db: impl PgExecutor<'e>,
        entity: EntityType,
        entity_id: DbId,
    ) -> Result<Option<Option<String>>, sqlx::Error> {
        let query = format!(
            "SELECT description FROM {} WHERE id = $1 FOR UPDATE",
            table_for(entity)
        );
        let row: Option<(Option<String>,)> = sqlx::query_as(&query)
            .bind(entity_id)
            .fetch_optional(db)
            .await?;
        Ok(row.map(|(description,)| description))
    }
}
