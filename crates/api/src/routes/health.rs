//! Service health. `/health` always answers 200 with a report; `/health/ready`
//! answers 503 until the database is reachable and its schema is current.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `ok`, `migrations_pending` or `database_unavailable`.
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseReport,
}

#[derive(Debug, Serialize)]
pub struct DatabaseReport {
    pub reachable: bool,
    pub migrations_applied: Option<i64>,
    pub migrations_known: Option<usize>,
    pub schema_version: Option<i64>,
}

impl HealthReport {
    fn is_ready(&self) -> bool {
        self.status == "ok"
    }
}

async fn collect(state: &AppState) -> HealthReport {
    let (status, database) = match reqhub_db::migration_state(&state.pool).await {
        Ok(migrations) => (
            if migrations.is_current() {
                "ok"
            } else {
                "migrations_pending"
            },
            DatabaseReport {
                reachable: true,
                migrations_applied: Some(migrations.applied),
                migrations_known: Some(migrations.known),
                schema_version: migrations.latest_version,
            },
        ),
        Err(e) => {
            // Reachable but unmigrated databases fail here too.
            let reachable = reqhub_db::health_check(&state.pool).await.is_ok();
            tracing::warn!(error = %e, reachable, "Migration ledger unavailable");
            (
                if reachable {
                    "migrations_pending"
                } else {
                    "database_unavailable"
                },
                DatabaseReport {
                    reachable,
                    migrations_applied: None,
                    migrations_known: None,
                    schema_version: None,
                },
            )
        }
    };

    HealthReport {
        status,
        version: env!("CARGO_PKG_VERSION"),
        database,
    }
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(collect(&state).await)
}

/// GET /health/ready
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = collect(&state).await;
    let code = if report.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(report))
}

/// Mounted at the root, outside `/api/v1` and its authentication.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
}
