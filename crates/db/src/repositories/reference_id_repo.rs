//! Reference-ID allocation.
//!
//! Sequential IDs are allocated under `pg_try_advisory_xact_lock`, which
//! never blocks and is released when the surrounding transaction ends.
//! A writer that loses the lock race falls back to a reference derived from
//! the entity's own UUID, so creation always makes progress.

use reqhub_core::entity::EntityType;
use reqhub_core::reference_id::{fallback_candidates, format_sequential, lock_key};
use reqhub_core::types::DbId;
use sqlx::PgConnection;

/// The reference assigned to a new entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedReference {
    pub reference_id: String,
    /// Present on the sequential path only.
    pub sequence_number: Option<i32>,
}

impl AllocatedReference {
    pub fn is_sequential(&self) -> bool {
        self.sequence_number.is_some()
    }
}

/// Table holding the entities of each type.
pub(crate) fn table_for(entity: EntityType) -> &'static str {
    match entity {
        EntityType::Epic => "epics",
        EntityType::UserStory => "user_stories",
        EntityType::AcceptanceCriteria => "acceptance_criteria",
        EntityType::Requirement => "requirements",
    }
}

pub struct ReferenceIdRepo;

impl ReferenceIdRepo {
    /// Allocate the next reference for `entity`.
    ///
    /// Must run on a connection inside the transaction that inserts the
    /// entity; the advisory lock is held until that transaction ends.
    pub async fn allocate(
        conn: &mut PgConnection,
        entity: EntityType,
        id: DbId,
    ) -> Result<AllocatedReference, sqlx::Error> {
        let locked: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
            .bind(lock_key(entity))
            .fetch_one(&mut *conn)
            .await?;

        if !locked {
            let reference_id = Self::free_fallback(conn, entity, id).await?;
            tracing::debug!(
                entity_type = entity.as_str(),
                %reference_id,
                "Reference lock contended, using fallback reference"
            );
            return Ok(AllocatedReference {
                reference_id,
                sequence_number: None,
            });
        }

        let query = format!(
            "SELECT COALESCE(MAX(sequence_number), 0) + 1 FROM {}",
            table_for(entity)
        );
        let next: i32 = sqlx::query_scalar(&query).fetch_one(&mut *conn).await?;

        Ok(AllocatedReference {
            reference_id: format_sequential(entity, next),
            sequence_number: Some(next),
        })
    }

    /// First fallback candidate not already in use. The widest candidate is
    /// the entity's full id and is returned without a lookup.
    async fn free_fallback(
        conn: &mut PgConnection,
        entity: EntityType,
        id: DbId,
    ) -> Result<String, sqlx::Error> {
        let mut candidates = fallback_candidates(entity, id);
        let widest = candidates.pop().unwrap_or_default();
        let query = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE reference_id = $1)",
            table_for(entity)
        );
        for candidate in candidates {
            let taken: bool = sqlx::query_scalar(&query)
                .bind(&candidate)
                .fetch_one(&mut *conn)
                .await?;
            if !taken {
                return Ok(candidate);
            }
        }
        Ok(widest)
    }

}
