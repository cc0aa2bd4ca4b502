use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reqhub_api::config::ServerConfig;
use reqhub_api::services::users::{self, CreateUserRequest};
use reqhub_api::state::AppState;
use reqhub_api::{background, router};
use reqhub_core::roles::Role;
use reqhub_db::repositories::UserRepo;
use reqhub_db::DbPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reqhub_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = reqhub_db::create_pool(&database_url, config.database_max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    reqhub_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    reqhub_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Seed administrator ---
    if let Err(e) = seed_admin(&pool).await {
        tracing::error!(error = %e, "Failed to seed administrator account");
    }

    // --- Token cleanup ---
    let cleanup_cancel = tokio_util::sync::CancellationToken::new();
    let cleanup_handle = tokio::spawn(background::token_cleanup::run(
        pool.clone(),
        Duration::from_secs(config.token_cleanup_interval_secs),
        cleanup_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };

    let app = router::build_app_router(state, &config).expect("Invalid CORS_ORIGINS entry");

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cleanup_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), cleanup_handle).await;
    tracing::info!("Token cleanup job stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Create the administrator named by `ADMIN_USERNAME` when it does not exist.
///
/// Does nothing unless `ADMIN_USERNAME`, `ADMIN_PASSWORD` and `ADMIN_EMAIL`
/// are all set.
async fn seed_admin(pool: &DbPool) -> anyhow::Result<()> {
    let (Ok(username), Ok(password), Ok(email)) = (
        std::env::var("ADMIN_USERNAME"),
        std::env::var("ADMIN_PASSWORD"),
        std::env::var("ADMIN_EMAIL"),
    ) else {
        return Ok(());
    };

    if UserRepo::find_by_username(pool, &username)
        .await
        .context("looking up seed administrator")?
        .is_some()
    {
        tracing::debug!(%username, "Seed administrator already exists");
        return Ok(());
    }

    let user = users::create(
        pool,
        CreateUserRequest {
            username,
            email,
            password,
            role: Some(Role::Administrator.as_str().to_string()),
        },
    )
    .await
    .map_err(|e| anyhow::anyhow!("creating seed administrator: {}", e.info().message))?;

    tracing::info!(user_id = %user.id, username = %user.username, "Seed administrator created");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
