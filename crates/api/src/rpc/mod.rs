//! JSON-RPC 2.0 tool surface for machine agents, served at `POST /mcp`.
//!
//! Tools call the same services as the HTTP handlers and are authorized with
//! the caller's bearer token, so a tool can never do more than the matching
//! endpoint.

pub mod protocol;
pub mod tools;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use protocol::JsonRpcRequest;

/// POST /api/v1/mcp
///
/// Notifications are acknowledged with 202 and no body.
pub async fn handle(user: AuthUser, State(state): State<AppState>, body: Bytes) -> Response {
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            let message = format!("Parse error: {e}");
            return Json(protocol::error(None, protocol::PARSE_ERROR, &message)).into_response();
        }
    };

    match dispatch(&state, &user, request).await {
        Some(value) => Json(value).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Route one request. Returns `None` for notifications.
pub async fn dispatch(state: &AppState, user: &AuthUser, request: JsonRpcRequest) -> Option<Value> {
    if request.jsonrpc.as_deref().is_some_and(|v| v != "2.0") {
        return Some(protocol::error(
            request.id,
            protocol::INVALID_REQUEST,
            "jsonrpc must be \"2.0\"",
        ));
    }

    let expects_response = request.expects_response();
    let method = request.method.as_str();

    let reply = match method {
        "initialize" => {
            let protocol_version = request
                .params
                .as_ref()
                .and_then(|v| v.get("protocolVersion"))
                .and_then(|v| v.as_str())
                .unwrap_or(protocol::PROTOCOL_VERSION);
            protocol::response(
                request.id,
                json!({
                    "protocolVersion": protocol_version,
                    "serverInfo": {
                        "name": protocol::SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                    "capabilities": { "tools": {} },
                }),
            )
        }
        "notifications/initialized" | "initialized" => return None,
        "ping" => protocol::response(request.id, json!({})),
        "tools/list" => protocol::response(
            request.id,
            json!({ "tools": tools::tool_definitions() }),
        ),
        "tools/call" => {
            let Some(params) = request.params.as_ref().and_then(Value::as_object) else {
                return Some(protocol::error(
                    request.id,
                    protocol::INVALID_PARAMS,
                    "params must be an object",
                ));
            };
            let name = params.get("name").and_then(Value::as_str).unwrap_or("");
            if !tools::is_known(name) {
                return Some(protocol::error(
                    request.id,
                    protocol::INVALID_PARAMS,
                    &format!("Unknown tool: {name}"),
                ));
            }
            let args = match params.get("arguments") {
                None | Some(Value::Null) => json!({}),
                Some(v) => v.clone(),
            };

            tracing::debug!(tool = name, user_id = %user.user_id, "Tool call");
            let result = match tools::call(state, user, name, args).await {
                Ok(text) => protocol::tool_text(text),
                Err(err) => {
                    let info = err.info();
                    tracing::info!(tool = name, code = info.code, "Tool call failed");
                    protocol::tool_error(&info)
                }
            };
            protocol::response(request.id, result)
        }
        _ => {
            if !expects_response {
                return None;
            }
            protocol::error(
                request.id,
                protocol::METHOD_NOT_FOUND,
                &format!("Method not found: {method}"),
            )
        }
    };

    expects_response.then_some(reply)
}
