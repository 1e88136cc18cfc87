//! # MCP Prompts
//!
//! Canned analysis prompts exposed over `prompts/list`/`prompts/get`,
//! scoped to the one prompt relevant to this server's feature set:
//! describing how a client should interpret a returned screen capture
//! resource.

use serde_json::{json, Value};

const DESCRIBE_CAPTURE_TEMPLATE: &str = "You have been given a screen capture resource at {{uri}}. \
Describe what is visible, focusing on any text, errors, or UI state relevant to the user's task.";

pub fn list() -> Value {
    json!({
        "prompts": [
            {
                "name": "describe_capture",
                "description": "Ask the model to describe a captured screen resource.",
                "arguments": [
                    {"name": "uri", "description": "Resource URI returned by capture_screen or capture_window", "required": true}
                ]
            }
        ]
    })
}

pub fn get(name: &str, arguments: &Value) -> Option<Value> {
    if name != "describe_capture" {
        return None;
    }
    let uri = arguments.get("uri").and_then(Value::as_str).unwrap_or("");
    let text = DESCRIBE_CAPTURE_TEMPLATE.replace("{{uri}}", uri);
    Some(json!({
        "description": "Describe a captured screen resource",
        "messages": [
            {"role": "user", "content": {"type": "text", "text": text}}
        ]
    }))
}
