//! # Protocol Module
//!
//! Transport-agnostic MCP/JSON-RPC plumbing: the request/response envelope,
//! the method dispatcher, and the tools/resources/prompts handlers it
//! routes to. Every transport (`stdio`, `sse`, `ws`) shares this module and
//! differs only in how bytes get in and out.

pub mod dispatcher;
pub mod jsonrpc;
pub mod prompts;
pub mod resources;
pub mod tools;

use crate::capture::BackendRegistry;
use crate::config::ServerConfig;
use crate::core::ResourceCache;
use crate::encoder::Encoder;
use crate::session::StreamManager;
use std::sync::Arc;

pub use dispatcher::{DispatchOutcome, ProtocolDispatcher};
pub use jsonrpc::{JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

/// Shared state every transport hands to the dispatcher. Cheap to clone
/// (everything inside is already an `Arc`).
#[derive(Clone)]
pub struct ServerContext {
    pub registry: Arc<BackendRegistry>,
    pub encoder: Arc<dyn Encoder>,
    pub cache: Arc<ResourceCache>,
    pub manager: Arc<StreamManager>,
    pub config: Arc<ServerConfig>,
}
