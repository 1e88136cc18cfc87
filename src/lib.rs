//! # Screen Capture Streaming MCP Server
//!
//! Exposes captured frames to remote agents over the Model Context Protocol:
//! discovers displays and windows, captures frames through the best
//! available platform backend, and publishes them as addressable resources
//! and as live streams over stdio, SSE, and WebSocket.
//!
//! ## Architecture
//!
//! - [`capture`]: platform backend selection (`BackendRegistry`) and the
//!   `CaptureBackend` contract each tier implements.
//! - [`core`]: the bounded, content-addressed [`core::ResourceCache`] that
//!   decouples frame production from frame delivery.
//! - [`encoder`]: the black-box PNG/JPEG encoder every session calls into.
//! - [`session`]: `FrameTimer` pacing, `QualityController` adaptive quality,
//!   `StreamSession`'s producer loop, and the `StreamManager` registry.
//! - [`protocol`]: the transport-agnostic JSON-RPC dispatcher, tool
//!   registry, resource/prompt handlers.
//! - [`transport`]: stdio, SSE, and WebSocket framing built on top of the
//!   dispatcher.
//! - [`config`]: environment-driven `ServerConfig`.
//! - [`error`]: the shared `CaptureError` hierarchy and its JSON-RPC code
//!   mapping.
//!
//! `build_context` is the one startup routine: it selects a capture
//! backend, constructs the cache/encoder/manager, and returns a
//! [`protocol::ServerContext`] every transport shares by cloning (everything
//! inside is already `Arc`-backed, so cloning is cheap and there is no
//! hidden global mutable state).

pub mod capture;
pub mod config;
pub mod core;
pub mod encoder;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

use crate::capture::BackendRegistry;
use crate::config::ServerConfig;
use crate::core::ResourceCache;
use crate::encoder::{Encoder, ImageEncoder};
use crate::error::CaptureResult;
use crate::protocol::ServerContext;
use crate::session::StreamManager;
use std::sync::Arc;

/// Select a capture backend, build the cache/encoder/manager, and assemble
/// the shared [`ServerContext`] every transport dispatches through.
///
/// This is the one place process-wide state is constructed; everything
/// downstream receives an explicit handle rather than reaching for a
/// global.
pub async fn build_context(config: ServerConfig) -> CaptureResult<ServerContext> {
    let registry = Arc::new(BackendRegistry::select().await?);
    let encoder: Arc<dyn Encoder> = Arc::new(ImageEncoder);
    let cache = Arc::new(ResourceCache::new(config.cache_capacity));
    let config = Arc::new(config);
    let manager = Arc::new(StreamManager::new(
        registry.active(),
        Arc::clone(&encoder),
        Arc::clone(&cache),
        &config,
    ));

    Ok(ServerContext {
        registry,
        encoder,
        cache,
        manager,
        config,
    })
}
