//! # WebSocket Transport
//!
//! Full-duplex JSON-RPC plus the binary resource triplet: a
//! `resource_metadata` JSON text frame, then a raw binary frame, then the
//! JSON-RPC acknowledgment, exactly as `_send_binary_resource` in
//! `mcp_websocket_server.py` does it. Also the only transport that can
//! auto-push `FrameReady` events from a subscribed stream without
//! base64-inflating them first.

use crate::protocol::{DispatchOutcome, JsonRpcNotification, JsonRpcRequest, ProtocolDispatcher, ServerContext};
use crate::session::SessionEvent;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(ctx): State<ServerContext>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, ctx))
}

async fn handle_socket(mut socket: WebSocket, ctx: ServerContext) {
    let queue_size = ctx.config.ws_queue_size;
    let (event_tx, mut event_rx) = mpsc::channel::<(uuid::Uuid, SessionEvent)>(queue_size);
    let mut subscriptions: Vec<(uuid::Uuid, crate::session::SubscriberId)> = Vec::new();

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let Some(incoming) = incoming else { break };
                let msg = match incoming {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(error = %e, "websocket receive error");
                        break;
                    }
                };
                match msg {
                    Message::Text(text) => {
                        let request: JsonRpcRequest = match serde_json::from_str(&text) {
                            Ok(req) => req,
                            Err(e) => {
                                warn!(error = %e, "failed to parse JSON-RPC request");
                                continue;
                            }
                        };

                        if request.method == "tools/call"
                            && request.params.get("name").and_then(|n| n.as_str()) == Some("create_stream")
                        {
                            if let DispatchOutcome::Response(resp) =
                                ProtocolDispatcher::dispatch(&ctx, request, true).await
                            {
                                if let Some(result) = &resp.result {
                                    subscribe_to_stream(&ctx, result, &event_tx, &mut subscriptions);
                                }
                                if send_response(&mut socket, &resp).await.is_err() {
                                    break;
                                }
                            }
                            continue;
                        }

                        match ProtocolDispatcher::dispatch(&ctx, request, true).await {
                            DispatchOutcome::Response(resp) => {
                                if send_response(&mut socket, &resp).await.is_err() {
                                    break;
                                }
                            }
                            DispatchOutcome::BinaryResource { ack, uri, mime, bytes, metadata } => {
                                if send_binary_triplet(&mut socket, &uri, mime, &bytes, metadata, &ack)
                                    .await
                                    .is_err()
                                {
                                    break;
                                }
                            }
                            DispatchOutcome::NoResponse => {}
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                let Some((stream_id, event)) = event else { continue };
                if forward_session_event(&ctx, &mut socket, stream_id, event).await.is_err() {
                    break;
                }
            }
        }
    }

    for (stream_id, sub_id) in subscriptions {
        if let Ok(session) = ctx.manager.get(stream_id) {
            session.unsubscribe(sub_id);
        }
    }
}

fn subscribe_to_stream(
    ctx: &ServerContext,
    result: &serde_json::Value,
    event_tx: &mpsc::Sender<(uuid::Uuid, SessionEvent)>,
    subscriptions: &mut Vec<(uuid::Uuid, crate::session::SubscriberId)>,
) {
    // `tools/call` wraps every result as `{"content": [{"type": "text",
    // "text": "<json>"}]}`; the stream id is inside that embedded text.
    let Some(text) = result
        .get("content")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("text"))
        .and_then(|t| t.as_str())
    else {
        return;
    };
    let Ok(stream_info) = serde_json::from_str::<serde_json::Value>(text) else {
        return;
    };
    let Some(id_str) = stream_info.get("id").and_then(|v| v.as_str()) else {
        return;
    };
    let Ok(stream_id) = uuid::Uuid::parse_str(id_str) else {
        return;
    };
    let Ok(session) = ctx.manager.get(stream_id) else {
        return;
    };
    let (tx, mut rx) = mpsc::channel::<SessionEvent>(ctx.config.ws_queue_size);
    let sub_id = session.subscribe(tx);
    subscriptions.push((stream_id, sub_id));

    let relay = event_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if relay.send((stream_id, event)).await.is_err() {
                break;
            }
        }
    });
}

async fn forward_session_event(
    ctx: &ServerContext,
    socket: &mut WebSocket,
    stream_id: uuid::Uuid,
    event: SessionEvent,
) -> Result<(), axum::Error> {
    match event {
        SessionEvent::FrameReady { uri, mime, width, height, quality, sequence } => {
            if let Ok(entry) = ctx.cache.get(&uri) {
                let metadata = json!({
                    "width": width, "height": height, "quality": quality,
                    "sequence": sequence, "streamId": stream_id.to_string(),
                });
                let notification = JsonRpcNotification::new(
                    "notifications/stream_frame",
                    json!({"streamId": stream_id.to_string(), "uri": uri}),
                );
                let ack = serde_json::to_value(&notification).unwrap_or(json!({}));
                send_binary_triplet(socket, &uri, mime, &entry.bytes, metadata, &ack).await?;
            }
            Ok(())
        }
        SessionEvent::Stopped { reason } => {
            let notification = JsonRpcNotification::new(
                "notifications/stream_stopped",
                json!({"streamId": stream_id.to_string(), "reason": reason}),
            );
            socket
                .send(Message::Text(serde_json::to_string(&notification).unwrap_or_default()))
                .await
        }
    }
}

async fn send_response<T: serde::Serialize>(
    socket: &mut WebSocket,
    value: &T,
) -> Result<(), axum::Error> {
    socket
        .send(Message::Text(serde_json::to_string(value).unwrap_or_default()))
        .await
}

async fn send_binary_triplet<T: serde::Serialize>(
    socket: &mut WebSocket,
    uri: &str,
    mime: &'static str,
    bytes: &[u8],
    metadata: serde_json::Value,
    ack: &T,
) -> Result<(), axum::Error> {
    let metadata_msg = json!({
        "type": "resource_metadata",
        "uri": uri,
        "mimeType": mime,
        "size": bytes.len(),
        "metadata": metadata,
    });
    socket
        .send(Message::Text(serde_json::to_string(&metadata_msg).unwrap_or_default()))
        .await?;
    socket.send(Message::Binary(bytes.to_vec())).await?;
    debug!(uri, size = bytes.len(), "sent binary resource triplet");
    send_response(socket, ack).await
}
