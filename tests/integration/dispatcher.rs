//! `ProtocolDispatcher` routing and JSON-RPC error code mapping.

use crate::common::{test_context, FailingBackend};
use screen_stream_mcp::protocol::{DispatchOutcome, JsonRpcRequest, ProtocolDispatcher};
use serde_json::json;

fn request(method: &str, params: serde_json::Value) -> JsonRpcRequest {
    serde_json::from_value(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    }))
    .unwrap()
}

#[tokio::test]
async fn initialize_reports_binary_resources_only_for_binary_capable_transports() {
    let ctx = test_context(std::sync::Arc::new(FailingBackend));
    let req = request("initialize", json!({}));

    let DispatchOutcome::Response(resp) =
        ProtocolDispatcher::dispatch(&ctx, req.clone(), false).await
    else {
        panic!("expected a plain response");
    };
    assert_eq!(resp.result.unwrap()["experimental"]["binaryResources"], false);

    let DispatchOutcome::Response(resp) = ProtocolDispatcher::dispatch(&ctx, req, true).await else {
        panic!("expected a plain response");
    };
    assert_eq!(resp.result.unwrap()["experimental"]["binaryResources"], true);
}

#[tokio::test]
async fn unknown_method_maps_to_method_not_found_code() {
    let ctx = test_context(std::sync::Arc::new(FailingBackend));
    let req = request("nonexistent/method", json!({}));

    let DispatchOutcome::Response(resp) = ProtocolDispatcher::dispatch(&ctx, req, false).await else {
        panic!("expected a plain response");
    };
    let error = resp.error.expect("unknown method should produce an error");
    assert_eq!(error.code, -32601);
}

#[tokio::test]
async fn resources_read_of_unknown_uri_maps_to_not_found() {
    let ctx = test_context(std::sync::Arc::new(FailingBackend));
    let req = request("resources/read", json!({"uri": "screen://capture/000000000000"}));

    let DispatchOutcome::Response(resp) = ProtocolDispatcher::dispatch(&ctx, req, false).await else {
        panic!("expected a plain response");
    };
    let error = resp.error.expect("missing resource should produce an error");
    assert_eq!(error.code, -32001);
}

#[tokio::test]
async fn notification_never_produces_a_response() {
    let ctx = test_context(std::sync::Arc::new(FailingBackend));
    let req: JsonRpcRequest = serde_json::from_value(json!({
        "jsonrpc": "2.0",
        "method": "notifications/initialized",
    }))
    .unwrap();

    let outcome = ProtocolDispatcher::dispatch(&ctx, req, false).await;
    assert!(matches!(outcome, DispatchOutcome::NoResponse));
}
