//! # ProtocolDispatcher
//!
//! Transport-agnostic JSON-RPC method routing: `initialize`, `tools/list`,
//! `tools/call`, `resources/list`, `resources/read`, `prompts/list`,
//! `prompts/get`, and `notifications/*`. One static match per method,
//! mirroring the `if method == ...: elif method == ...` chain in
//! `mcp_websocket_server.py`'s `_process_mcp_request`, generalized so stdio
//! and SSE share the exact same routing stdio/SSE/WS all call into.

use crate::error::{CaptureError, CaptureResult};
use crate::protocol::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use crate::protocol::{prompts, resources, tools, ServerContext};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// What a transport should do with a dispatched request.
pub enum DispatchOutcome {
    /// A normal JSON-RPC response: send it as-is.
    Response(JsonRpcResponse),
    /// A resolved resource read on a binary-capable transport: send the
    /// triplet (metadata, raw bytes, then this ack) instead of embedding
    /// base64 in the result.
    BinaryResource {
        ack: JsonRpcResponse,
        uri: String,
        mime: &'static str,
        bytes: Vec<u8>,
        metadata: Value,
    },
    /// The request was a notification; no response is sent.
    NoResponse,
}

pub struct ProtocolDispatcher;

impl ProtocolDispatcher {
    /// Route one JSON-RPC request. `supports_binary` is set by the calling
    /// transport: `true` for WebSocket, `false` for stdio and SSE.
    pub async fn dispatch(
        ctx: &ServerContext,
        request: JsonRpcRequest,
        supports_binary: bool,
    ) -> DispatchOutcome {
        let id = request.id.clone().unwrap_or(Value::Null);

        if request.method.starts_with("notifications/") {
            debug!(method = %request.method, "received notification");
            return DispatchOutcome::NoResponse;
        }

        let result = Self::handle(ctx, &request.method, &request.params, supports_binary).await;

        match result {
            Ok(Outcome::Plain(value)) => {
                if request.is_notification() {
                    DispatchOutcome::NoResponse
                } else {
                    DispatchOutcome::Response(JsonRpcResponse::ok(id, value))
                }
            }
            Ok(Outcome::Binary {
                uri,
                mime,
                bytes,
                metadata,
                ack,
            }) => DispatchOutcome::BinaryResource {
                ack: JsonRpcResponse::ok(id, ack),
                uri,
                mime,
                bytes,
                metadata,
            },
            Err(e) => {
                warn!(method = %request.method, error = %e, "request failed");
                if request.is_notification() {
                    DispatchOutcome::NoResponse
                } else {
                    DispatchOutcome::Response(JsonRpcResponse::err(id, &e))
                }
            }
        }
    }

    async fn handle(
        ctx: &ServerContext,
        method: &str,
        params: &Value,
        supports_binary: bool,
    ) -> CaptureResult<Outcome> {
        match method {
            "initialize" => Ok(Outcome::Plain(initialize_result(ctx, supports_binary))),
            "tools/list" => Ok(Outcome::Plain(json!({ "tools": tools::tool_list() }))),
            "tools/call" => {
                let name = params
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| CaptureError::validation("name", "required string", "missing"))?;
                let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
                let result = tools::call(ctx, name, &arguments).await?;
                Ok(Outcome::Plain(json!({
                    "content": [{"type": "text", "text": result.to_string()}]
                })))
            }
            "resources/list" => Ok(Outcome::Plain(resources::list(ctx))),
            "resources/read" => {
                let uri = params
                    .get("uri")
                    .and_then(Value::as_str)
                    .ok_or_else(|| CaptureError::validation("uri", "required string", "missing"))?;
                let entry = resources::read(ctx, uri)?;
                if supports_binary {
                    Ok(Outcome::Binary {
                        uri: uri.to_string(),
                        mime: entry.mime.as_str(),
                        bytes: entry.bytes.clone(),
                        metadata: json!({
                            "width": entry.metadata.width,
                            "height": entry.metadata.height,
                            "quality": entry.metadata.quality,
                            "capturedAtUnixMs": entry.metadata.captured_at_unix_ms,
                        }),
                        ack: resources::read_as_binary_ack(&entry, uri),
                    })
                } else {
                    Ok(Outcome::Plain(resources::read_as_base64_result(&entry, uri)))
                }
            }
            "prompts/list" => Ok(Outcome::Plain(prompts::list())),
            "prompts/get" => {
                let name = params
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| CaptureError::validation("name", "required string", "missing"))?;
                let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
                prompts::get(name, &arguments)
                    .map(Outcome::Plain)
                    .ok_or_else(|| CaptureError::not_found(format!("prompt:{name}")))
            }
            other => Err(CaptureError::method_not_found(other)),
        }
    }
}

enum Outcome {
    Plain(Value),
    Binary {
        uri: String,
        mime: &'static str,
        bytes: Vec<u8>,
        metadata: Value,
        ack: Value,
    },
}

fn initialize_result(ctx: &ServerContext, supports_binary: bool) -> Value {
    json!({
        "protocolVersion": ctx.config.protocol_version,
        "serverInfo": {
            "name": ctx.config.server_name,
            "version": ctx.config.server_version,
        },
        "capabilities": {
            "tools": {},
            "resources": { "subscribe": false, "listChanged": false },
            "prompts": {}
        },
        "experimental": { "binaryResources": supports_binary }
    })
}
