//! # SSE Transport
//!
//! Two-endpoint HTTP transport matching the MCP SSE convention: clients
//! `GET /sse` to open a long-lived event stream (one bounded queue per
//! connection, a keep-alive comment every `keep_alive_timeout_secs`
//! seconds), then `POST /messages?session_id=...` to submit requests whose
//! JSON-RPC responses arrive asynchronously over that stream, built on
//! `axum`'s SSE response type.

use crate::protocol::{DispatchOutcome, JsonRpcNotification, JsonRpcRequest, ProtocolDispatcher, ServerContext};
use crate::session::SessionEvent;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures_util::stream::Stream;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::warn;
use uuid::Uuid;

pub struct SseState {
    ctx: ServerContext,
    sessions: Mutex<HashMap<Uuid, mpsc::Sender<String>>>,
    queue_size: usize,
    keep_alive: Duration,
}

impl SseState {
    pub fn new(ctx: ServerContext) -> Arc<Self> {
        let queue_size = ctx.config.sse_queue_size;
        let keep_alive = Duration::from_secs(ctx.config.keep_alive_timeout_secs);
        Arc::new(Self {
            ctx,
            sessions: Mutex::new(HashMap::new()),
            queue_size,
            keep_alive,
        })
    }
}

pub async fn sse_handler(
    State(state): State<Arc<SseState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel::<String>(state.queue_size);
    state.sessions.lock().await.insert(session_id, tx);

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages?session_id={session_id}"));
    let announce = tokio_stream::once(Ok(endpoint));

    let body = ReceiverStream::new(rx).map(|payload| Ok(Event::default().data(payload)));

    Sse::new(announce.chain(body)).keep_alive(
        KeepAlive::new()
            .interval(state.keep_alive)
            .text("keep-alive"),
    )
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub session_id: Uuid,
}

/// Accepts one JSON-RPC request, dispatches it, and pushes the response
/// onto the matching SSE stream. Always returns `202 Accepted` immediately;
/// the caller reads the actual result from its `/sse` connection.
pub async fn messages_handler(
    State(state): State<Arc<SseState>>,
    Query(query): Query<MessagesQuery>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let tx = state.sessions.lock().await.get(&query.session_id).cloned();
    let Some(tx) = tx else {
        return axum::http::StatusCode::NOT_FOUND;
    };

    let is_create_stream = request.method == "tools/call"
        && request.params.get("name").and_then(|n| n.as_str()) == Some("create_stream");

    let ctx = state.ctx.clone();
    tokio::spawn(async move {
        // SSE cannot carry raw binary frames; resources/read embeds base64.
        let outcome = ProtocolDispatcher::dispatch(&ctx, request, false).await;
        let payload = match &outcome {
            DispatchOutcome::Response(resp) => serde_json::to_string(resp).ok(),
            DispatchOutcome::BinaryResource { ack, .. } => serde_json::to_string(ack).ok(),
            DispatchOutcome::NoResponse => None,
        };
        if is_create_stream {
            if let DispatchOutcome::Response(resp) = &outcome {
                if let Some(result) = &resp.result {
                    subscribe_to_stream(&ctx, result, tx.clone());
                }
            }
        }
        if let Some(payload) = payload {
            if tx.send(payload).await.is_err() {
                warn!("SSE subscriber disconnected before response could be delivered");
            }
        }
    });

    axum::http::StatusCode::ACCEPTED
}

/// After `create_stream` succeeds over SSE, subscribe this connection's
/// queue to the new session's events so frames auto-push as
/// `resource_updated` notifications, matching the WS auto-push behavior
/// minus the raw binary frame (SSE has no binary framing).
fn subscribe_to_stream(ctx: &ServerContext, result: &serde_json::Value, tx: mpsc::Sender<String>) {
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
    let Ok(stream_id) = Uuid::parse_str(id_str) else {
        return;
    };
    let Ok(session) = ctx.manager.get(stream_id) else {
        return;
    };

    let (event_tx, mut event_rx) = mpsc::channel::<SessionEvent>(ctx.config.sse_queue_size);
    let sub_id = session.subscribe(event_tx);
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let notification = match event {
                SessionEvent::FrameReady {
                    uri,
                    mime,
                    width,
                    height,
                    quality,
                    sequence,
                } => JsonRpcNotification::new(
                    "notifications/resource_updated",
                    json!({
                        "streamId": stream_id.to_string(), "uri": uri, "mimeType": mime,
                        "width": width, "height": height, "quality": quality, "sequence": sequence,
                    }),
                ),
                SessionEvent::Stopped { reason } => {
                    session.unsubscribe(sub_id);
                    let notification = JsonRpcNotification::new(
                        "notifications/stream_stopped",
                        json!({"streamId": stream_id.to_string(), "reason": reason}),
                    );
                    let Ok(payload) = serde_json::to_string(&notification) else {
                        break;
                    };
                    let _ = tx.send(payload).await;
                    break;
                }
            };
            let Ok(payload) = serde_json::to_string(&notification) else {
                continue;
            };
            if tx.send(payload).await.is_err() {
                session.unsubscribe(sub_id);
                break;
            }
        }
    });
}

/// Periodically drop sessions whose receiver has already been dropped
/// (client disconnected). `/sse` streams don't get an explicit close
/// callback from axum, so this sweep is how the session map avoids
/// growing without bound.
pub fn spawn_session_reaper(state: Arc<SseState>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            state.sessions.lock().await.retain(|_, tx| !tx.is_closed());
        }
    })
}
