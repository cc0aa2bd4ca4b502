//! Integration tests for `/api/v1/config`: lookup types and status models.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, create_epic, delete_auth, get_auth, patch_json_auth, post_json_auth,
    user_with_token,
};
use reqhub_core::roles::Role;
use serde_json::{json, Value};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Lookup types
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_seeded_lookup_types_are_readable(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "reader", Role::Commenter).await;

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/config/requirement-types", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    for expected in ["Functional", "Non-Functional", "Technical", "Business"] {
        assert!(names.contains(&expected), "missing {expected}");
    }

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/config/relationship-types", &token).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lookup_type_administration(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let (_user, user_token) = user_with_token(&pool, "planner", Role::User).await;
    let body = json!({ "name": "Security", "description": "Threat mitigations" });

    let app = common::build_test_app(pool.clone());
    let response =
        post_json_auth(app, "/api/v1/config/requirement-types", body.clone(), &user_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let app = common::build_test_app(pool.clone());
    let response =
        post_json_auth(app, "/api/v1/config/requirement-types", body.clone(), &admin).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let uri = format!(
        "/api/v1/config/requirement-types/{}",
        created["id"].as_str().unwrap()
    );

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, "/api/v1/config/requirement-types", body, &admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "conflict_duplicate");

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool);
    let response = get_auth(app, &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Status models
// ---------------------------------------------------------------------------

fn status_id(model: &Value, name: &str) -> String {
    model["statuses"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == name)
        .and_then(|s| s["id"].as_str())
        .unwrap_or_else(|| panic!("status {name} missing"))
        .to_string()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_configured_transitions_are_enforced(pool: PgPool) {
    let admin = admin_token(&pool).await;
    create_epic(&pool, &admin, "Governed").await;
    create_epic(&pool, &admin, "Also governed").await;

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/config/status-models/default/epic", &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let model = body_json(response).await;
    assert_eq!(model["is_default"], true);
    assert!(model["transitions"].as_array().unwrap().is_empty());
    let model_id = model["id"].as_str().unwrap().to_string();

    // Without transitions every move is allowed.
    let app = common::build_test_app(pool.clone());
    let response = patch_json_auth(
        app,
        "/api/v1/epics/EP-002/status",
        json!({ "status": "Done" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool.clone());
    let body = json!({
        "from_status_id": status_id(&model, "Backlog"),
        "to_status_id": status_id(&model, "In Progress"),
    });
    let response = post_json_auth(
        app,
        &format!("/api/v1/config/status-models/{model_id}/transitions"),
        body,
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let transition = body_json(response).await;
    assert_eq!(transition["from_status"], "Backlog");
    assert_eq!(transition["to_status"], "In Progress");

    // Once a graph exists, unlisted moves are rejected.
    let app = common::build_test_app(pool.clone());
    let response = patch_json_auth(
        app,
        "/api/v1/epics/EP-001/status",
        json!({ "status": "Done" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["code"],
        "forbidden_invalid_transition"
    );

    let app = common::build_test_app(pool.clone());
    let response = patch_json_auth(
        app,
        "/api/v1/epics/EP-001/status",
        json!({ "status": "In Progress" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(
        app,
        &format!(
            "/api/v1/config/status-models/{model_id}/transitions/{}",
            transition["id"].as_str().unwrap()
        ),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The default model cannot be removed.
    let app = common::build_test_app(pool);
    let response = delete_auth(
        app,
        &format!("/api/v1/config/status-models/{model_id}"),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_new_status_model_becomes_default(pool: PgPool) {
    let admin = admin_token(&pool).await;

    let app = common::build_test_app(pool.clone());
    let body = json!({ "entity_type": "requirement", "name": "Lean" });
    let response = post_json_auth(app, "/api/v1/config/status-models", body, &admin).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let model_id = body_json(response).await["id"].as_str().unwrap().to_string();

    // An empty model cannot become the default.
    let app = common::build_test_app(pool.clone());
    let default_uri = format!("/api/v1/config/status-models/{model_id}/default");
    let response = common::post_auth(app, &default_uri, &admin).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool.clone());
    let body = json!({ "name": "Proposed", "sort_order": 1 });
    let response = post_json_auth(
        app,
        &format!("/api/v1/config/status-models/{model_id}/statuses"),
        body,
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["is_initial"], true);

    let app = common::build_test_app(pool.clone());
    let response = common::post_auth(app, &default_uri, &admin).await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/config/status-models?entity_type=requirement", &admin).await;
    let json = body_json(response).await;
    let defaults: Vec<&Value> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m["is_default"] == true)
        .collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0]["name"], "Lean");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_default_model_must_cover_current_statuses(pool: PgPool) {
    let admin = admin_token(&pool).await;
    create_epic(&pool, &admin, "Already in Backlog").await;

    let app = common::build_test_app(pool.clone());
    let body = json!({ "entity_type": "epic", "name": "Lean" });
    let response = post_json_auth(app, "/api/v1/config/status-models", body, &admin).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let model_id = body_json(response).await["id"].as_str().unwrap().to_string();
    let statuses_uri = format!("/api/v1/config/status-models/{model_id}/statuses");
    let default_uri = format!("/api/v1/config/status-models/{model_id}/default");

    for (name, order) in [("Proposed", 1), ("Closed", 2)] {
        let app = common::build_test_app(pool.clone());
        let body = json!({ "name": name, "sort_order": order });
        let response = post_json_auth(app, &statuses_uri, body, &admin).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // EP-001 sits in Backlog, which the new model does not define.
    let app = common::build_test_app(pool.clone());
    let response = common::post_auth(app, &default_uri, &admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "conflict_in_use");

    let app = common::build_test_app(pool.clone());
    let response = patch_json_auth(
        app,
        "/api/v1/epics/EP-001/status",
        json!({ "status": "In Progress" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Once the model covers every live status it can take over.
    let app = common::build_test_app(pool.clone());
    let body = json!({ "name": "in progress", "sort_order": 3 });
    let response = post_json_auth(app, &statuses_uri, body, &admin).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = common::build_test_app(pool.clone());
    let response = common::post_auth(app, &default_uri, &admin).await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let response = patch_json_auth(
        app,
        "/api/v1/epics/EP-001/status",
        json!({ "status": "Closed" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "Closed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_new_model_cannot_start_as_default(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let app = common::build_test_app(pool);
    let body = json!({ "entity_type": "epic", "name": "Instant", "is_default": true });
    let response = post_json_auth(app, "/api/v1/config/status-models", body, &admin).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
