//! Periodic removal of expired refresh tokens and personal access tokens.
//!
//! Expired rows are already rejected at authentication time, so this job
//! only keeps the token tables small. Running it twice is harmless.

use std::time::Duration;

use reqhub_db::repositories::{PatRepo, RefreshTokenRepo};
use reqhub_db::DbPool;
use tokio_util::sync::CancellationToken;

/// Rows removed by one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepResult {
    pub refresh_tokens: u64,
    pub personal_access_tokens: u64,
}

/// Delete every expired refresh token and PAT once.
pub async fn sweep(pool: &DbPool) -> Result<SweepResult, sqlx::Error> {
    let refresh_tokens = RefreshTokenRepo::delete_expired(pool).await?;
    let personal_access_tokens = PatRepo::delete_expired(pool).await?;
    Ok(SweepResult {
        refresh_tokens,
        personal_access_tokens,
    })
}

/// Run the cleanup loop every `interval` until `cancel` is triggered.
pub async fn run(pool: DbPool, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Token cleanup job started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Token cleanup job stopping");
                break;
            }
            _ = ticker.tick() => {
                match sweep(&pool).await {
                    Ok(result) if result == SweepResult::default() => {
                        tracing::debug!("Token cleanup: nothing expired");
                    }
                    Ok(result) => {
                        tracing::info!(
                            refresh_tokens = result.refresh_tokens,
                            personal_access_tokens = result.personal_access_tokens,
                            "Token cleanup: purged expired tokens"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Token cleanup: sweep failed");
                    }
                }
            }
        }
    }
}
