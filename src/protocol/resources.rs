//! # MCP Resources
//!
//! `resources/list` advertises the one URI template this server serves;
//! `resources/read` resolves a concrete `screen://capture/<id>` URI out of
//! the [`ResourceCache`](crate::core::ResourceCache), returning the
//! dedicated `-32001` not-found code on a cache miss.

use crate::core::EncodedFrame;
use crate::error::CaptureResult;
use crate::protocol::ServerContext;
use serde_json::{json, Value};

pub fn list(_ctx: &ServerContext) -> Value {
    json!({
        "resources": [
            {
                "uriTemplate": "screen://capture/{id}",
                "name": "Screen Capture",
                "description": "Encoded frames produced by capture_screen, capture_window, or a running stream.",
                "mimeType": "image/png"
            }
        ]
    })
}

pub fn read(ctx: &ServerContext, uri: &str) -> CaptureResult<EncodedFrame> {
    ctx.cache.get(uri)
}

/// Non-binary-capable transports (stdio, SSE) embed the frame as a base64
/// `blob` directly in the JSON-RPC result, matching the MCP resource
/// contents convention.
pub fn read_as_base64_result(entry: &EncodedFrame, uri: &str) -> Value {
    use base64::Engine;
    let blob = base64::engine::general_purpose::STANDARD.encode(&entry.bytes);
    json!({
        "contents": [{
            "uri": uri,
            "mimeType": entry.mime.as_str(),
            "blob": blob,
        }]
    })
}

/// Binary-capable transports (WebSocket) send the JSON acknowledgment
/// alone; the bytes go out-of-band via the triplet in `transport::ws`.
pub fn read_as_binary_ack(entry: &EncodedFrame, uri: &str) -> Value {
    json!({
        "uri": uri,
        "binary": true,
        "size": entry.bytes.len(),
        "mimeType": entry.mime.as_str(),
    })
}
