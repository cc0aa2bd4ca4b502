//! JSON-RPC 2.0 envelopes and the error-code mapping used by `/mcp`.

use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ErrorInfo;

/// Protocol version reported when the client does not announce one.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const SERVER_NAME: &str = "reqhub";

// Standard codes.
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

// Application codes.
pub const UNAUTHORIZED: i64 = -32001;
pub const NOT_FOUND: i64 = -32004;
pub const CONFLICT: i64 = -32009;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Requests without an id (or with `null`) are notifications.
    pub fn expects_response(&self) -> bool {
        !matches!(self.id, None | Some(Value::Null))
    }
}

pub fn response(id: Option<Value>, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

pub fn error(id: Option<Value>, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

/// JSON-RPC code for an application error, keyed on its HTTP status.
pub fn error_code(info: &ErrorInfo) -> i64 {
    match info.status {
        StatusCode::BAD_REQUEST => INVALID_PARAMS,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UNAUTHORIZED,
        StatusCode::NOT_FOUND => NOT_FOUND,
        StatusCode::CONFLICT => CONFLICT,
        _ => INTERNAL_ERROR,
    }
}

/// Successful `tools/call` result carrying one text block.
pub fn tool_text(text: String) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": false,
    })
}

/// Failed `tools/call` result. The taxonomy code and the JSON-RPC code
/// travel in `_meta` so agents can branch without parsing the text.
pub fn tool_error(info: &ErrorInfo) -> Value {
    json!({
        "content": [{ "type": "text", "text": format!("{}: {}", info.code, info.message) }],
        "isError": true,
        "_meta": { "code": info.code, "errorCode": error_code(info) },
    })
}
