//! Shared test doubles for integration and e2e tests.

use async_trait::async_trait;
use screen_stream_mcp::capture::{
    BackendPerformanceInfo, CaptureBackend, CaptureSource, Display, PixelFormat, RawFrame, Region,
};
use screen_stream_mcp::config::ServerConfig;
use screen_stream_mcp::core::ResourceCache;
use screen_stream_mcp::encoder::{Encoder, ImageEncoder};
use screen_stream_mcp::error::{CaptureError, CaptureResult};
use screen_stream_mcp::protocol::ServerContext;
use screen_stream_mcp::session::StreamManager;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A capture backend that never touches the display server: every call
/// returns a small solid-color frame, counted so tests can assert on how
/// many captures a session actually performed.
pub struct MockBackend {
    calls: AtomicU64,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU64::new(0),
        })
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CaptureBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn enumerate_displays(&self) -> CaptureResult<Vec<Display>> {
        Ok(vec![Display {
            id: 0,
            x: 0,
            y: 0,
            w: 1920,
            h: 1080,
            primary: true,
        }])
    }

    async fn capture(&self, _source: &CaptureSource, _region: Option<Region>) -> CaptureResult<RawFrame> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(RawFrame {
            data: vec![0u8; 8 * 8 * 4],
            width: 8,
            height: 8,
            format: PixelFormat::Bgra,
            monotonic_capture_ns: self.calls.load(Ordering::Relaxed) as u128,
        })
    }

    fn performance_info(&self) -> BackendPerformanceInfo {
        BackendPerformanceInfo::default()
    }
}

/// A backend whose `capture` always fails with a retryable error, for
/// exercising the producer loop's drop-and-continue path.
pub struct FailingBackend;

#[async_trait]
impl CaptureBackend for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn enumerate_displays(&self) -> CaptureResult<Vec<Display>> {
        Ok(vec![])
    }

    async fn capture(&self, _source: &CaptureSource, _region: Option<Region>) -> CaptureResult<RawFrame> {
        Err(CaptureError::frame_capture("no frame available"))
    }

    fn performance_info(&self) -> BackendPerformanceInfo {
        BackendPerformanceInfo::default()
    }
}

/// Build a [`ServerContext`] around a given backend, bypassing
/// `BackendRegistry::select` (which would probe the real display server).
pub fn test_context(backend: Arc<dyn CaptureBackend>) -> ServerContext {
    let mut config = ServerConfig::default();
    config.max_concurrent_streams = 2;
    config.cache_capacity = 8;
    test_context_with_config(backend, config)
}

pub fn test_context_with_config(backend: Arc<dyn CaptureBackend>, config: ServerConfig) -> ServerContext {
    let registry = Arc::new(screen_stream_mcp::capture::BackendRegistry::with_backend(backend));
    let encoder: Arc<dyn Encoder> = Arc::new(ImageEncoder);
    let cache = Arc::new(ResourceCache::new(config.cache_capacity));
    let config = Arc::new(config);
    let manager = Arc::new(StreamManager::new(
        registry.active(),
        Arc::clone(&encoder),
        Arc::clone(&cache),
        &config,
    ));

    ServerContext {
        registry,
        encoder,
        cache,
        manager,
        config,
    }
}
