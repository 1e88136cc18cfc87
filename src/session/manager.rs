//! # StreamManager
//!
//! Owns every running [`StreamSession`], enforces the global concurrent-
//! stream cap, and periodically reaps sessions that have stopped. One
//! instance lives for the lifetime of the process, shared via `Arc` between
//! the protocol dispatcher and the periodic cleanup task: a single
//! `RwLock`-guarded map plus a background sweep task.

use crate::capture::{CaptureBackend, CaptureSource, Region};
use crate::config::ServerConfig;
use crate::core::{Mime, ResourceCache};
use crate::encoder::Encoder;
use crate::error::{CaptureError, CaptureResult};
use crate::session::stream_session::{StreamInfo, StreamSession, StreamSessionBuilder};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

pub type StreamHandle = Arc<StreamSession>;

/// Caller-supplied parameters for a new stream. Fields absent from the
/// request are filled from `ServerConfig`'s defaults by the protocol layer
/// before this struct is built.
pub struct CreateStreamParams {
    pub source: CaptureSource,
    pub region: Option<Region>,
    pub format: Mime,
    pub fps: u32,
    pub quality: u32,
    pub adaptive_quality: bool,
    pub frame_skip: bool,
}

struct Limits {
    max_concurrent_streams: usize,
    min_quality: u32,
    max_quality: u32,
    max_fps: u32,
}

pub struct StreamManager {
    sessions: RwLock<HashMap<Uuid, StreamHandle>>,
    limits: RwLock<Limits>,
    backend: Arc<dyn CaptureBackend>,
    encoder: Arc<dyn Encoder>,
    cache: Arc<ResourceCache>,
    shutdown_window: Duration,
}

impl StreamManager {
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        encoder: Arc<dyn Encoder>,
        cache: Arc<ResourceCache>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            limits: RwLock::new(Limits {
                max_concurrent_streams: config.max_concurrent_streams,
                min_quality: config.min_stream_quality,
                max_quality: config.max_stream_quality,
                max_fps: config.max_stream_fps,
            }),
            backend,
            encoder,
            cache,
            shutdown_window: Duration::from_millis(config.shutdown_window_ms),
        }
    }

    /// Create, start, and register a new stream session. Fails with
    /// `CaptureError::resource` if the concurrent-stream cap is already at
    /// capacity; the caller should surface this as `-32003` over JSON-RPC.
    pub fn create(&self, params: CreateStreamParams) -> CaptureResult<StreamHandle> {
        let active = self
            .sessions
            .read()
            .unwrap()
            .values()
            .filter(|s| s.state() != crate::session::stream_session::SessionState::Stopped)
            .count();
        let limits = self.limits.read().unwrap();
        if active >= limits.max_concurrent_streams {
            return Err(CaptureError::resource(
                "stream_slot",
                format!(
                    "max_concurrent_streams ({}) reached",
                    limits.max_concurrent_streams
                ),
            ));
        }
        let fps = params.fps.clamp(1, limits.max_fps);
        let quality = params.quality.clamp(limits.min_quality, limits.max_quality);
        let (min_quality, max_quality) = (limits.min_quality, limits.max_quality);
        drop(limits);

        let session = StreamSessionBuilder::new(
            params.source,
            Arc::clone(&self.backend),
            Arc::clone(&self.encoder),
            Arc::clone(&self.cache),
        )
        .with_region(params.region)
        .with_format(params.format)
        .with_fps(fps)
        .with_quality(quality, min_quality, max_quality)
        .with_adaptive_quality(params.adaptive_quality)
        .with_frame_skip(params.frame_skip)
        .build();

        session.start();
        let id = session.id();
        self.sessions.write().unwrap().insert(id, Arc::clone(&session));
        info!(session = %id, fps, quality, "stream created");
        Ok(session)
    }

    pub fn get(&self, id: Uuid) -> CaptureResult<StreamHandle> {
        self.sessions
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| CaptureError::not_found(format!("screen://stream/{id}")))
    }

    pub fn info(&self, id: Uuid) -> CaptureResult<StreamInfo> {
        Ok(self.get(id)?.get_info())
    }

    pub fn list(&self) -> Vec<StreamInfo> {
        self.sessions
            .read()
            .unwrap()
            .values()
            .map(|s| s.get_info())
            .collect()
    }

    pub async fn stop(&self, id: Uuid) -> CaptureResult<()> {
        let session = self.get(id)?;
        session.stop(self.shutdown_window).await
    }

    pub async fn stop_all(&self) {
        let sessions: Vec<StreamHandle> = self.sessions.read().unwrap().values().cloned().collect();
        for session in sessions {
            let _ = session.stop(self.shutdown_window).await;
        }
    }

    pub fn set_limits(&self, max_concurrent_streams: Option<usize>) {
        if let Some(n) = max_concurrent_streams {
            self.limits.write().unwrap().max_concurrent_streams = n;
        }
    }

    /// Remove stopped sessions from the registry. Run periodically by
    /// [`spawn_cleanup`]; safe to call directly from tests.
    pub fn reap_stopped(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| s.state() != crate::session::stream_session::SessionState::Stopped);
        before - sessions.len()
    }
}

/// Spawn the background sweep that periodically reaps stopped sessions.
/// The returned handle is owned by the caller (typically the process's
/// top-level runtime); aborting it simply stops the sweep, it does not stop
/// any session.
pub fn spawn_cleanup(manager: Arc<StreamManager>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let reaped = manager.reap_stopped();
            if reaped > 0 {
                debug!(reaped, "swept stopped stream sessions");
            }
        }
    })
}
