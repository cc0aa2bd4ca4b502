//! Persistence for the requirements hub: row models, DTOs and repositories
//! over PostgreSQL, plus the reference-ID allocator.

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

static MIGRATOR: Migrator = sqlx::migrate!("../../db/migrations");

/// Schema version of a live database compared with the migrations compiled
/// into this binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationState {
    /// Successfully applied migrations recorded in `_sqlx_migrations`.
    pub applied: i64,
    /// Migrations embedded in the binary.
    pub known: usize,
    /// Version of the newest applied migration.
    pub latest_version: Option<i64>,
}

impl MigrationState {
    /// Every embedded migration has been applied.
    pub fn is_current(&self) -> bool {
        self.applied >= self.known as i64
    }
}

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify connectivity.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Read the applied-migration ledger. Fails when the ledger table is missing.
pub async fn migration_state(pool: &DbPool) -> Result<MigrationState, sqlx::Error> {
    let (applied, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success",
    )
    .fetch_one(pool)
    .await?;

    Ok(MigrationState {
        applied,
        known: MIGRATOR.iter().count(),
        latest_version,
    })
}
