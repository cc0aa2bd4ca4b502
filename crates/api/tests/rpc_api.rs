//! Integration tests for the JSON-RPC tool endpoint at `/api/v1/mcp`.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{admin_token, body_json, create_epic, create_story, post_json, post_json_auth, user_with_token};
use reqhub_core::roles::Role;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

const MCP: &str = "/api/v1/mcp";

async fn rpc(pool: &PgPool, token: &str, body: Value) -> Value {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, MCP, body, token).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn call_tool(pool: &PgPool, token: &str, name: &str, arguments: Value) -> Value {
    let reply = rpc(
        pool,
        token,
        json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments },
        }),
    )
    .await;
    assert_eq!(reply["id"], 7);
    reply["result"].clone()
}

fn text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_requires_bearer_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(app, MCP, json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_initialize_and_list_tools(pool: PgPool) {
    let token = admin_token(&pool).await;

    let reply = rpc(
        &pool,
        &token,
        json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} }),
    )
    .await;
    assert_eq!(reply["jsonrpc"], "2.0");
    assert_eq!(reply["id"], 1);
    assert_eq!(reply["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(reply["result"]["serverInfo"]["name"], "reqhub");
    assert!(reply["result"]["capabilities"]["tools"].is_object());

    let reply = rpc(&pool, &token, json!({ "jsonrpc": "2.0", "id": "two", "method": "tools/list" })).await;
    assert_eq!(reply["id"], "two");
    let names: Vec<&str> = reply["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"create_epic"));
    assert!(names.contains(&"epic_hierarchy"));
    assert!(names.contains(&"search"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_notification_is_acknowledged_without_body(pool: PgPool) {
    let token = admin_token(&pool).await;
    let app = common::build_test_app(pool);
    let body = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
    let response = post_json_auth(app, MCP, body, &token).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_protocol_errors(pool: PgPool) {
    let token = admin_token(&pool).await;

    let reply = rpc(&pool, &token, json!({ "jsonrpc": "2.0", "id": 3, "method": "does/not/exist" })).await;
    assert_eq!(reply["error"]["code"], -32601);

    let reply = rpc(
        &pool,
        &token,
        json!({ "jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": { "name": "drop_tables" } }),
    )
    .await;
    assert_eq!(reply["error"]["code"], -32602);

    let app = common::build_test_app(pool);
    let request = Request::builder()
        .method("POST")
        .uri(MCP)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reply = body_json(response).await;
    assert_eq!(reply["error"]["code"], -32700);
    assert!(reply["id"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_and_outline_through_tools(pool: PgPool) {
    let token = admin_token(&pool).await;

    let result = call_tool(&pool, &token, "create_epic", json!({ "title": "Agent Epic", "priority": 1 })).await;
    assert_eq!(result["isError"], false);
    assert_eq!(text(&result), "Created EP-001 Agent Epic");

    let result = call_tool(
        &pool,
        &token,
        "create_user_story",
        json!({
            "epic_id": "EP-001",
            "title": "Login",
            "description": common::STORY_DESCRIPTION,
        }),
    )
    .await;
    assert_eq!(text(&result), "Created US-001 Login");

    let result = call_tool(
        &pool,
        &token,
        "create_acceptance_criteria",
        json!({ "user_story_id": "US-001", "description": "WHEN a THEN b" }),
    )
    .await;
    assert_eq!(result["isError"], false);

    let result = call_tool(&pool, &token, "epic_hierarchy", json!({ "epic_id": "EP-001" })).await;
    let outline = text(&result);
    assert!(outline.starts_with("EP-001 Agent Epic [Backlog] (priority 1)"));
    assert!(outline.contains("US-001"));
    assert!(outline.contains("AC-001"));

    let result = call_tool(&pool, &token, "change_status", json!({ "id": "US-001", "status": "in progress" })).await;
    assert_eq!(text(&result), "US-001 is now In Progress");

    let result = call_tool(&pool, &token, "get_entity", json!({ "id": "EP-001" })).await;
    let entity: Value = serde_json::from_str(text(&result)).unwrap();
    assert_eq!(entity["title"], "Agent Epic");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tool_failures_carry_error_codes(pool: PgPool) {
    let token = admin_token(&pool).await;
    create_epic(&pool, &token, "Parent").await;
    create_story(&pool, &token, "EP-001").await;

    let result = call_tool(&pool, &token, "get_entity", json!({ "id": "EP-404" })).await;
    assert_eq!(result["isError"], true);
    assert_eq!(result["_meta"]["code"], "not_found");
    assert_eq!(result["_meta"]["errorCode"], -32004);

    let result = call_tool(
        &pool,
        &token,
        "create_user_story",
        json!({ "epic_id": "EP-001", "title": "Bad", "description": "no template here" }),
    )
    .await;
    assert_eq!(result["isError"], true);
    assert_eq!(result["_meta"]["code"], "validation_error");
    assert_eq!(result["_meta"]["errorCode"], -32602);

    let result = call_tool(&pool, &token, "get_entity", json!({ "id": "00000000-0000-4000-8000-000000000000" })).await;
    assert_eq!(result["isError"], true);
    assert_eq!(result["_meta"]["code"], "validation_error");

    let (_viewer, viewer_token) = user_with_token(&pool, "viewer", Role::Commenter).await;
    let result = call_tool(&pool, &viewer_token, "create_epic", json!({ "title": "Nope" })).await;
    assert_eq!(result["isError"], true);
    assert_eq!(result["_meta"]["code"], "forbidden");
    assert_eq!(result["_meta"]["errorCode"], -32001);

    // Commenters may still comment.
    let result = call_tool(&pool, &viewer_token, "add_comment", json!({ "id": "US-001", "content": "Nice" })).await;
    assert_eq!(result["isError"], false);
    let result = call_tool(&pool, &viewer_token, "list_comments", json!({ "id": "US-001" })).await;
    let threads: Value = serde_json::from_str(text(&result)).unwrap();
    assert_eq!(threads[0]["content"], "Nice");
}
