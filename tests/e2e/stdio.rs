//! Stdio transport driven end-to-end over an in-process duplex pipe,
//! matching the "spawn the server as a child process and speak JSON-RPC over
//! its stdio" scenario without actually spawning a process.

use crate::common::{test_context, MockBackend};
use screen_stream_mcp::transport::stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::test]
async fn initialize_then_capture_screen_over_stdio() {
    let ctx = test_context(MockBackend::new());

    let (server_end, client_end) = tokio::io::duplex(4096);
    let (server_read, server_write) = tokio::io::split(server_end);
    let (client_read, mut write_half) = tokio::io::split(client_end);

    let server = tokio::spawn(stdio::run_with(server_read, server_write, ctx));
    let mut lines = BufReader::new(client_read).lines();

    write_half
        .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n")
        .await
        .unwrap();
    let reply = lines.next_line().await.unwrap().expect("initialize response");
    let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(reply["result"]["protocolVersion"], "2024-11-05");

    write_half
        .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/call\",\"params\":{\"name\":\"capture_screen\",\"arguments\":{}}}\n")
        .await
        .unwrap();
    let reply = lines.next_line().await.unwrap().expect("tools/call response");
    let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert!(reply["result"]["content"][0]["text"].as_str().unwrap().contains("uri"));

    drop(write_half);
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), server).await;
}

#[tokio::test]
async fn malformed_line_gets_a_parse_error_response() {
    let ctx = test_context(MockBackend::new());

    let (server_end, client_end) = tokio::io::duplex(4096);
    let (server_read, server_write) = tokio::io::split(server_end);
    let (client_read, mut write_half) = tokio::io::split(client_end);

    let server = tokio::spawn(stdio::run_with(server_read, server_write, ctx));
    let mut lines = BufReader::new(client_read).lines();

    write_half.write_all(b"not valid json at all\n").await.unwrap();
    let reply = lines.next_line().await.unwrap().expect("parse error response");
    let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(reply["error"]["code"], -32700);
    assert!(reply["id"].is_null());

    drop(write_half);
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), server).await;
}
