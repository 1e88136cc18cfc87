//! # Transport Adapters
//!
//! stdio, SSE, and WebSocket framing, all sharing the same
//! [`crate::protocol::ProtocolDispatcher`]. [`http_router`] assembles the
//! axum `Router` the HTTP run mode serves; [`stdio::run`] is the
//! alternative entrypoint for the default, argument-free run mode.

pub mod sse;
pub mod stdio;
pub mod ws;

use crate::protocol::ServerContext;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// Which optional HTTP routers to mount. stdio has no HTTP surface and is
/// run separately via [`stdio::run`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpRouterOptions {
    pub enable_sse: bool,
    pub enable_ws: bool,
}

/// Build the HTTP router for the `serve` run mode. Always serves a liveness
/// probe at `/health`; SSE and WS routes are mounted per `options`, each
/// spawning its own background maintenance task (session reaper for SSE,
/// none needed for WS — its subscriptions are torn down when the socket
/// closes).
pub fn http_router(ctx: ServerContext, options: HttpRouterOptions) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new().route("/health", get(health));

    if options.enable_sse {
        let sse_state = sse::SseState::new(ctx.clone());
        sse::spawn_session_reaper(Arc::clone(&sse_state), Duration::from_secs(30));
        let sse_router = Router::new()
            .route("/sse", get(sse::sse_handler))
            .route("/messages", post(sse::messages_handler))
            .with_state(sse_state);
        router = router.merge(sse_router);
    }

    if options.enable_ws {
        let ws_router = Router::new()
            .route("/ws", get(ws::ws_handler))
            .with_state(ctx.clone());
        router = router.merge(ws_router);
    }

    router.layer(cors)
}

async fn health() -> &'static str {
    "ok"
}
