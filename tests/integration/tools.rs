//! Boundary validation for the `tools/call` argument surface (spec.md §8).

use crate::common::{test_context, MockBackend};
use screen_stream_mcp::protocol::tools;
use serde_json::json;

#[tokio::test]
async fn fps_zero_is_invalid_argument() {
    let ctx = test_context(MockBackend::new());
    let err = tools::call(&ctx, "create_stream", &json!({"display_id": 0, "fps": 0}))
        .await
        .unwrap_err();
    assert_eq!(err.json_rpc_code(), -32602);
}

#[tokio::test]
async fn fps_above_120_is_invalid_argument() {
    let ctx = test_context(MockBackend::new());
    let err = tools::call(&ctx, "create_stream", &json!({"display_id": 0, "fps": 121}))
        .await
        .unwrap_err();
    assert_eq!(err.json_rpc_code(), -32602);
}

#[tokio::test]
async fn fps_at_120_is_accepted() {
    let ctx = test_context(MockBackend::new());
    let result = tools::call(&ctx, "create_stream", &json!({"display_id": 0, "fps": 120}))
        .await
        .unwrap();
    assert_eq!(result["target_fps"], 120);
}

#[tokio::test]
async fn quality_outside_1_100_is_invalid_argument() {
    let ctx = test_context(MockBackend::new());
    let too_low = tools::call(&ctx, "capture_screen", &json!({"display_id": 0, "quality": 0}))
        .await
        .unwrap_err();
    assert_eq!(too_low.json_rpc_code(), -32602);

    let too_high = tools::call(&ctx, "capture_screen", &json!({"display_id": 0, "quality": 101}))
        .await
        .unwrap_err();
    assert_eq!(too_high.json_rpc_code(), -32602);
}

#[tokio::test]
async fn unknown_display_id_is_invalid_argument() {
    let ctx = test_context(MockBackend::new());
    let err = tools::call(&ctx, "capture_screen", &json!({"display_id": 7}))
        .await
        .unwrap_err();
    assert_eq!(err.json_rpc_code(), -32602);
}

#[tokio::test]
async fn capture_screen_with_known_display_succeeds() {
    let ctx = test_context(MockBackend::new());
    let result = tools::call(&ctx, "capture_screen", &json!({"display_id": 0, "format": "png"}))
        .await
        .unwrap();
    assert_eq!(result["success"], true);
    assert!(result["resource_uri"]
        .as_str()
        .unwrap()
        .starts_with("screen://capture/"));
    assert_eq!(result["mime"], "image/png");
}
