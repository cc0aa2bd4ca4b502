#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use reqhub_api::auth::jwt::{generate_access_token, JwtConfig};
use reqhub_api::auth::password::hash_password;
use reqhub_api::config::ServerConfig;
use reqhub_api::router::build_app_router;
use reqhub_api::state::AppState;
use reqhub_core::roles::Role;
use reqhub_db::models::user::{CreateUser, User};
use reqhub_db::repositories::UserRepo;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "test_password_123!";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_max_connections: 5,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        pat_default_expiry_days: 90,
        token_cleanup_interval_secs: 3600,
        jwt: JwtConfig {
            secret: "test-secret-do-not-use-in-production".to_string(),
            access_token_expiry_mins: 60,
            refresh_token_expiry_days: 7,
        },
    }
}

/// Build the full application router, with the production middleware stack,
/// over the given pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config).expect("test CORS origins are valid")
}

// ---------------------------------------------------------------------------
// Principals
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`] directly through the repository.
pub async fn create_user(pool: &PgPool, username: &str, role: Role) -> User {
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@test.com"),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        role,
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// Access token for `user`, signed with the test secret.
pub fn token_for(user: &User) -> String {
    generate_access_token(user.id, &user.username, user.role(), &test_config().jwt)
        .expect("token generation should succeed")
}

/// Create a user with `role` and return it with a bearer token.
pub async fn user_with_token(pool: &PgPool, username: &str, role: Role) -> (User, String) {
    let user = create_user(pool, username, role).await;
    let token = token_for(&user);
    (user, token)
}

/// Shorthand for an Administrator token.
pub async fn admin_token(pool: &PgPool) -> String {
    user_with_token(pool, "admin", Role::Administrator).await.1
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

/// POST without a body.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const STORY_DESCRIPTION: &str =
    "As a user, I want to login, so that I can access my account";

/// Create an epic through the API and return its JSON.
pub async fn create_epic(pool: &PgPool, token: &str, title: &str) -> serde_json::Value {
    let app = build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/epics",
        serde_json::json!({ "title": title, "priority": 2 }),
        token,
    )
    .await;
    assert_eq!(response.status(), 201, "epic creation should succeed");
    body_json(response).await
}

/// Create a user story under `epic_ref` through the API and return its JSON.
pub async fn create_story(pool: &PgPool, token: &str, epic_ref: &str) -> serde_json::Value {
    let app = build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/user-stories",
        serde_json::json!({
            "epic_id": epic_ref,
            "title": "Login",
            "description": STORY_DESCRIPTION,
        }),
        token,
    )
    .await;
    assert_eq!(response.status(), 201, "story creation should succeed");
    body_json(response).await
}

/// Add an acceptance criterion to `story_ref` through the API.
pub async fn create_criteria(
    pool: &PgPool,
    token: &str,
    story_ref: &str,
    text: &str,
) -> serde_json::Value {
    let app = build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/user-stories/{story_ref}/acceptance-criteria"),
        serde_json::json!({ "description": text }),
        token,
    )
    .await;
    assert_eq!(response.status(), 201, "criteria creation should succeed");
    body_json(response).await
}
