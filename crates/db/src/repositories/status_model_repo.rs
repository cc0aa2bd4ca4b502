//! Repository for status models, their statuses and transitions.

use reqhub_core::entity::EntityType;
use reqhub_core::types::DbId;
use reqhub_core::workflow::WorkflowModel;
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::reference_id_repo::table_for;
use crate::models::status_model::{
    CreateStatus, CreateStatusModel, Status, StatusModel, StatusModelDetail, StatusTransition,
    UpdateStatus, UpdateStatusModel,
};

const MODEL_COLUMNS: &str = "id, entity_type, name, description, is_default, created_at, updated_at";

const STATUS_COLUMNS: &str = "id, status_model_id, name, description, sort_order, \
    is_initial, is_final, created_at, updated_at";

const TRANSITION_SELECT: &str = "SELECT t.id, t.status_model_id, \
        t.from_status_id, f.name AS from_status, \
        t.to_status_id, s.name AS to_status, t.created_at \
    FROM status_transitions t \
    JOIN statuses f ON f.id = t.from_status_id \
    JOIN statuses s ON s.id = t.to_status_id";

pub struct StatusModelRepo;

impl StatusModelRepo {
    // -----------------------------------------------------------------------
    // Models
    // -----------------------------------------------------------------------

    pub async fn list<'e>(
        db: impl PgExecutor<'e>,
        entity_type: Option<EntityType>,
    ) -> Result<Vec<StatusModel>, sqlx::Error> {
        let query = format!(
            "SELECT {MODEL_COLUMNS} FROM status_models
             WHERE ($1::text IS NULL OR entity_type = $1)
             ORDER BY entity_type ASC, name ASC"
        );
        sqlx::query_as::<_, StatusModel>(&query)
            .bind(entity_type.map(|t| t.as_str()))
            .fetch_all(db)
            .await
    }

    pub async fn find_by_id<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<StatusModel>, sqlx::Error> {
        let query = format!("SELECT {MODEL_COLUMNS} FROM status_models WHERE id = $1");
        sqlx::query_as::<_, StatusModel>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_default<'e>(
        db: impl PgExecutor<'e>,
        entity_type: EntityType,
    ) -> Result<Option<StatusModel>, sqlx::Error> {
        let query = format!(
            "SELECT {MODEL_COLUMNS} FROM status_models
             WHERE entity_type = $1 AND is_default"
        );
        sqlx::query_as::<_, StatusModel>(&query)
            .bind(entity_type.as_str())
            .fetch_optional(db)
            .await
    }

    /// Load a model together with its statuses and transitions.
    pub async fn load_detail(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<StatusModelDetail>, sqlx::Error> {
        let Some(model) = Self::find_by_id(&mut *conn, id).await? else {
            return Ok(None);
        };
        let statuses = Self::list_statuses(&mut *conn, id).await?;
        let transitions = Self::list_transitions(&mut *conn, id).await?;
        Ok(Some(StatusModelDetail {
            model,
            statuses,
            transitions,
        }))
    }

    /// Snapshot of the default model for an entity type, if one exists.
    pub async fn load_workflow(
        conn: &mut PgConnection,
        entity_type: EntityType,
    ) -> Result<Option<WorkflowModel>, sqlx::Error> {
        let Some(model) = Self::find_default(&mut *conn, entity_type).await? else {
            return Ok(None);
        };
        let detail = Self::load_detail(conn, model.id).await?;
        Ok(detail.map(|d| d.to_workflow()))
    }

    /// Insert a model. When it is the new default, the previous default of
    /// the same entity type is cleared first.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateStatusModel,
    ) -> Result<StatusModel, sqlx::Error> {
        if input.is_default {
            Self::clear_default(&mut *conn, &input.entity_type).await?;
        }
        let query = format!(
            "INSERT INTO status_models (id, entity_type, name, description, is_default)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {MODEL_COLUMNS}"
        );
        sqlx::query_as::<_, StatusModel>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.entity_type)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.is_default)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn update<'e>(
        db: impl PgExecutor<'e>,
        id: DbId,
        input: &UpdateStatusModel,
    ) -> Result<Option<StatusModel>, sqlx::Error> {
        let query = format!(
            "UPDATE status_models SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
             WHERE id = $1
             RETURNING {MODEL_COLUMNS}"
        );
        sqlx::query_as::<_, StatusModel>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(db)
            .await
    }

    /// Make `id` the default model of its entity type.
    pub async fn set_default(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<StatusModel>, sqlx::Error> {
        let Some(model) = Self::find_by_id(&mut *conn, id).await? else {
            return Ok(None);
        };
        Self::clear_default(&mut *conn, &model.entity_type).await?;
        let query = format!(
            "UPDATE status_models SET is_default = true
             WHERE id = $1
             RETURNING {MODEL_COLUMNS}"
        );
        sqlx::query_as::<_, StatusModel>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    async fn clear_default(conn: &mut PgConnection, entity_type: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE status_models SET is_default = false
             WHERE entity_type = $1 AND is_default",
        )
        .bind(entity_type)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM status_models WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Statuses
    // -----------------------------------------------------------------------

    pub async fn list_statuses<'e>(
        db: impl PgExecutor<'e>,
        model_id: DbId,
    ) -> Result<Vec<Status>, sqlx::Error> {
        let query = format!(
            "SELECT {STATUS_COLUMNS} FROM statuses
             WHERE status_model_id = $1
             ORDER BY sort_order ASC, name ASC"
        );
        sqlx::query_as::<_, Status>(&query)
            .bind(model_id)
            .fetch_all(db)
            .await
    }

    pub async fn find_status<'e>(
        db: impl PgExecutor<'e>,
        model_id: DbId,
        status_id: DbId,
    ) -> Result<Option<Status>, sqlx::Error> {
        let query = format!(
            "SELECT {STATUS_COLUMNS} FROM statuses
             WHERE id = $1 AND status_model_id = $2"
        );
        sqlx::query_as::<_, Status>(&query)
            .bind(status_id)
            .bind(model_id)
            .fetch_optional(db)
            .await
    }

    /// Insert a status. An initial status displaces the previous one.
    pub async fn create_status(
        conn: &mut PgConnection,
        model_id: DbId,
        input: &CreateStatus,
    ) -> Result<Status, sqlx::Error> {
        if input.is_initial {
            Self::clear_initial(&mut *conn, model_id).await?;
        }
        let query = format!(
            "INSERT INTO statuses
                (id, status_model_id, name, description, sort_order, is_initial, is_final)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {STATUS_COLUMNS}"
        );
        sqlx::query_as::<_, Status>(&query)
            .bind(Uuid::new_v4())
            .bind(model_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.sort_order)
            .bind(input.is_initial)
            .bind(input.is_final)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn update_status(
        conn: &mut PgConnection,
        model_id: DbId,
        status_id: DbId,
        input: &UpdateStatus,
    ) -> Result<Option<Status>, sqlx::Error> {
        if input.is_initial == Some(true) {
            Self::clear_initial(&mut *conn, model_id).await?;
        }
        let query = format!(
            "UPDATE statuses SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                sort_order = COALESCE($5, sort_order),
                is_initial = COALESCE($6, is_initial),
                is_final = COALESCE($7, is_final)
             WHERE id = $1 AND status_model_id = $2
             RETURNING {STATUS_COLUMNS}"
        );
        sqlx::query_as::<_, Status>(&query)
            .bind(status_id)
            .bind(model_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.sort_order)
            .bind(input.is_initial)
            .bind(input.is_final)
            .fetch_optional(&mut *conn)
            .await
    }

    async fn clear_initial(conn: &mut PgConnection, model_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE statuses SET is_initial = false
             WHERE status_model_id = $1 AND is_initial",
        )
        .bind(model_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Number of `entity` rows currently in the named status (case-insensitive).
    pub async fn status_usage<'e>(
        db: impl PgExecutor<'e>,
        entity: EntityType,
        status_name: &str,
    ) -> Result<i64, sqlx::Error> {
        if !entity.has_workflow() {
            return Ok(0);
        }
        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE lower(status) = lower($1)",
            table_for(entity)
        );
        sqlx::query_scalar(&query)
            .bind(status_name)
            .fetch_one(db)
            .await
    }

    /// Number of `entity` rows whose status is not one of `status_names`
    /// (case-insensitive).
    pub async fn count_outside_statuses<'e>(
        db: impl PgExecutor<'e>,
        entity: EntityType,
        status_names: &[String],
    ) -> Result<i64, sqlx::Error> {
        if !entity.has_workflow() {
            return Ok(0);
        }
        let lowered: Vec<String> = status_names.iter().map(|n| n.to_lowercase()).collect();
        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE lower(status) <> ALL($1)",
            table_for(entity)
        );
        sqlx::query_scalar(&query)
            .bind(lowered)
            .fetch_one(db)
            .await
    }

    /// Delete a status; transitions touching it go with it.
    pub async fn delete_status<'e>(
        db: impl PgExecutor<'e>,
        model_id: DbId,
        status_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM statuses WHERE id = $1 AND status_model_id = $2")
            .bind(status_id)
            .bind(model_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    pub async fn list_transitions<'e>(
        db: impl PgExecutor<'e>,
        model_id: DbId,
    ) -> Result<Vec<StatusTransition>, sqlx::Error> {
        let query = format!(
            "{TRANSITION_SELECT}
             WHERE t.status_model_id = $1
             ORDER BY f.sort_order ASC, s.sort_order ASC"
        );
        sqlx::query_as::<_, StatusTransition>(&query)
            .bind(model_id)
            .fetch_all(db)
            .await
    }

    /// Insert an edge. Both statuses must belong to `model_id`; the
    /// composite foreign keys reject anything else.
    pub async fn create_transition(
        conn: &mut PgConnection,
        model_id: DbId,
        from_status_id: DbId,
        to_status_id: DbId,
    ) -> Result<StatusTransition, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO status_transitions (id, status_model_id, from_status_id, to_status_id)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(model_id)
        .bind(from_status_id)
        .bind(to_status_id)
        .execute(&mut *conn)
        .await?;

        let query = format!("{TRANSITION_SELECT} WHERE t.id = $1");
        sqlx::query_as::<_, StatusTransition>(&query)
            .bind(id)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn delete_transition<'e>(
        db: impl PgExecutor<'e>,
        model_id: DbId,
        transition_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM status_transitions WHERE id = $1 AND status_model_id = $2")
                .bind(transition_id)
                .bind(model_id)
                .execute(db)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
