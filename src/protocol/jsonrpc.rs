//! # JSON-RPC 2.0 Envelope
//!
//! Request/response/error types shared by every transport.

use crate::error::CaptureError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default = "default_jsonrpc_version")]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    /// Absent for notifications; present (possibly `null`) for requests.
    #[serde(default)]
    pub id: Option<Value>,
}

fn default_jsonrpc_version() -> String {
    "2.0".to_string()
}

impl JsonRpcRequest {
    /// A notification carries no `id` field at all. `params.get("id")`
    /// absence is distinguished from `id: null` by the caller checking
    /// this before calling `JsonRpcResponse::error`/`ok`.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl From<&CaptureError> for JsonRpcError {
    fn from(err: &CaptureError) -> Self {
        Self {
            code: err.json_rpc_code(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, error: &CaptureError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// A server-initiated message with no matching request `id`, e.g.
/// `notifications/initialized` or an auto-push frame-ready event.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Value,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parses_without_id_as_notification() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn test_error_response_omits_result_field() {
        let err = CaptureError::not_found("screen://capture/deadbeef0000");
        let resp = JsonRpcResponse::err(Value::from(1), &err);
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("result").is_none());
        assert_eq!(json["error"]["code"], -32001);
    }
}
