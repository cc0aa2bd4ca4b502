//! HTTP-level integration tests for `GET /api/v1/search`.

mod common;

use axum::http::StatusCode;
use common::{admin_token, body_json, create_criteria, create_story, get, get_auth, post_json_auth};
use sqlx::PgPool;

async fn seed(pool: &PgPool, token: &str) {
    for (title, description, priority) in [
        ("User Authentication", "Login and session handling", 1),
        ("Billing", "Invoices and payment authentication callbacks", 4),
        ("Reporting", "Dashboards", 3),
    ] {
        let app = common::build_test_app(pool.clone());
        let body = serde_json::json!({
            "title": title,
            "description": description,
            "priority": priority,
        });
        let response = post_json_auth(app, "/api/v1/epics", body, token).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    create_story(pool, token, "EP-001").await;
    create_criteria(pool, token, "US-001", "WHEN credentials are valid THEN login SHALL succeed")
        .await;
}

fn references(json: &serde_json::Value) -> Vec<String> {
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["reference_id"].as_str().unwrap().to_string())
        .collect()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_search_requires_authentication(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/search?q=login").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_title_matches_rank_first(pool: PgPool) {
    let token = admin_token(&pool).await;
    seed(&pool, &token).await;

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/search?q=authentication&type=epic", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total_count"], 2);
    assert_eq!(references(&json), ["EP-001", "EP-002"]);

    let top = json["data"][0]["score"].as_f64().unwrap();
    let second = json["data"][1]["score"].as_f64().unwrap();
    assert!(top > second);
    assert!(top <= 1.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reference_lookup(pool: PgPool) {
    let token = admin_token(&pool).await;
    seed(&pool, &token).await;

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/search?q=us-001", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["reference_id"], "US-001");
    assert_eq!(json["data"][0]["entity_type"], "user_story");
    assert_eq!(json["data"][0]["score"], 1.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_filters_without_query(pool: PgPool) {
    let token = admin_token(&pool).await;
    seed(&pool, &token).await;

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/search?type=epic&priority=4", &token).await;
    let json = body_json(response).await;
    assert_eq!(references(&json), ["EP-002"]);

    let app = common::build_test_app(pool.clone());
    let response = get_auth(
        app,
        "/api/v1/search?type=epic&sort_by=created_at&sort_order=asc&limit=2",
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["total_count"], 3);
    assert_eq!(references(&json), ["EP-001", "EP-002"]);

    // Acceptance criteria have no status, so a status filter excludes them.
    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/search?status=Backlog", &token).await;
    let json = body_json(response).await;
    assert!(references(&json).iter().all(|r| !r.starts_with("AC-")));

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/search?created_from=2000-01-01&created_to=2000-12-31", &token).await;
    assert_eq!(body_json(response).await["total_count"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_search_parameters(pool: PgPool) {
    let token = admin_token(&pool).await;

    for query in [
        "type=widget",
        "sort_by=title",
        "priority=9",
        "limit=1000",
        "created_from=yesterday",
    ] {
        let app = common::build_test_app(pool.clone());
        let response = get_auth(app, &format!("/api/v1/search?{query}"), &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{query}");
        assert_eq!(body_json(response).await["code"], "validation_error");
    }
}
