//! # StreamSession
//!
//! One running capture-and-publish pipeline: a backend, an encoder, a
//! pacing timer, an optional quality controller, and a set of subscribers
//! waiting on frames. Owns the producer task; dropping the last `Arc`
//! without calling [`StreamSession::stop`] leaves the task running until the
//! next `stop()` or process exit — the caller, not `Drop`, tears the
//! pipeline down.

use crate::capture::{CaptureBackend, CaptureSource, Region};
use crate::core::{Mime, ResourceCache};
use crate::encoder::Encoder;
use crate::error::{CaptureError, CaptureResult};
use crate::session::metrics::{FrameMetrics, MetricsSnapshot};
use crate::session::quality::QualityController;
use crate::session::timer::FrameTimer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle state of a [`StreamSession`]. Transitions Created -> Running,
/// Running <-> Paused, and any of those -> Stopped. Stopped is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    Running,
    Paused,
    Stopped,
}

/// Pushed to subscribers as frames are produced or the session ends.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    FrameReady {
        uri: String,
        mime: &'static str,
        width: u32,
        height: u32,
        quality: u32,
        sequence: u64,
    },
    Stopped {
        reason: String,
    },
}

pub type SubscriberId = u64;

struct Subscriber {
    id: SubscriberId,
    tx: mpsc::Sender<SessionEvent>,
}

/// Immutable parameters a session was created with, reported back via
/// `get_stream_info`.
#[derive(Debug, Clone, Serialize)]
pub struct StreamInfo {
    pub id: Uuid,
    pub source: CaptureSource,
    pub state: SessionState,
    pub target_fps: u32,
    pub current_quality: u32,
    pub format: &'static str,
    pub created_at: DateTime<Utc>,
    pub metrics: MetricsSnapshot,
}

impl Serialize for CaptureSource {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            CaptureSource::Display(id) => s.serialize_str(&format!("display:{id}")),
            CaptureSource::Window(handle) => s.serialize_str(&format!("window:{handle}")),
        }
    }
}

/// A running capture pipeline. Construct via [`StreamSessionBuilder`].
pub struct StreamSession {
    id: Uuid,
    source: CaptureSource,
    region: Option<Region>,
    format: Mime,
    target_fps: u32,
    frame_skip_enabled: bool,
    adaptive_quality_enabled: bool,
    created_at: DateTime<Utc>,

    backend: Arc<dyn CaptureBackend>,
    encoder: Arc<dyn Encoder>,
    cache: Arc<ResourceCache>,

    state: std::sync::Mutex<SessionState>,
    resume_notify: Notify,
    quality: std::sync::Mutex<QualityController>,
    metrics: std::sync::Mutex<FrameMetrics>,
    subscribers: std::sync::Mutex<Vec<Subscriber>>,
    next_subscriber_id: AtomicU64,
    sequence: AtomicU64,
    task: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl StreamSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// Begin the producer task. No-op if already started.
    pub fn start(self: &Arc<Self>) {
        {
            let mut state = self.state.lock().unwrap();
            if *state != SessionState::Created {
                return;
            }
            *state = SessionState::Running;
        }
        let session = Arc::clone(self);
        let handle = tokio::spawn(async move { session.run().await });
        *self.task.lock().unwrap() = Some(handle);
    }

    pub fn pause(&self) -> CaptureResult<()> {
        let mut state = self.state.lock().unwrap();
        match *state {
            SessionState::Running => {
                *state = SessionState::Paused;
                Ok(())
            }
            SessionState::Stopped => Err(CaptureError::streaming(
                self.id.to_string(),
                "cannot pause a stopped stream",
            )),
            _ => Ok(()),
        }
    }

    pub fn resume(&self) -> CaptureResult<()> {
        let mut state = self.state.lock().unwrap();
        match *state {
            SessionState::Paused => {
                *state = SessionState::Running;
                drop(state);
                self.resume_notify.notify_one();
                Ok(())
            }
            SessionState::Stopped => Err(CaptureError::streaming(
                self.id.to_string(),
                "cannot resume a stopped stream",
            )),
            _ => Ok(()),
        }
    }

    /// Idempotent: stopping an already-stopped session is a no-op success.
    pub async fn stop(&self, shutdown_window: Duration) -> CaptureResult<()> {
        let already_stopped = {
            let mut state = self.state.lock().unwrap();
            let was = *state == SessionState::Stopped;
            *state = SessionState::Stopped;
            was
        };
        self.resume_notify.notify_one();
        if already_stopped {
            return Ok(());
        }
        self.broadcast(SessionEvent::Stopped {
            reason: "stopped".to_string(),
        });
        let handle = self.task.lock().unwrap().take();
        if let Some(handle) = handle {
            if tokio::time::timeout(shutdown_window, handle).await.is_err() {
                warn!(session = %self.id, "producer task exceeded shutdown window, abandoning");
            }
        }
        self.subscribers.lock().unwrap().clear();
        Ok(())
    }

    /// Manual override of the target quality, bypassing the adaptive
    /// controller for this call (the next interval boundary may move it
    /// again if adaptive quality is enabled).
    pub fn adjust_quality(&self, quality: u32) -> CaptureResult<()> {
        let mut ctrl = self.quality.lock().unwrap();
        let clamped = ctrl.set_quality(quality);
        if clamped != quality {
            debug!(session = %self.id, requested = quality, clamped, "quality clamped to bounds");
        }
        Ok(())
    }

    pub fn get_info(&self) -> StreamInfo {
        StreamInfo {
            id: self.id,
            source: self.source.clone(),
            state: self.state(),
            target_fps: self.target_fps,
            current_quality: self.quality.lock().unwrap().current_quality(),
            format: match self.format {
                Mime::Png => "png",
                Mime::Jpeg => "jpeg",
            },
            created_at: self.created_at,
            metrics: self.metrics.lock().unwrap().snapshot(),
        }
    }

    /// Register a new subscriber. `tx`'s bounded capacity is set by the
    /// caller (SSE uses 10, WebSocket uses 5), so backpressure policy lives
    /// at the transport, not here.
    pub fn subscribe(&self, tx: mpsc::Sender<SessionEvent>) -> SubscriberId {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().unwrap().push(Subscriber { id, tx });
        id
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.lock().unwrap().retain(|s| s.id != id);
    }

    /// Number of subscribers currently registered. Used by tests to confirm
    /// a saturated subscriber was dropped rather than left stalling the
    /// producer loop.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    /// Overflow drops the slowest subscriber, not the producer: a saturated
    /// queue marks that subscriber unhealthy and removes it so its transport
    /// can close, rather than blocking or silently discarding frames for it
    /// forever.
    fn broadcast(&self, event: SessionEvent) {
        let mut subs = self.subscribers.lock().unwrap();
        subs.retain(|s| match s.tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(session = %self.id, subscriber = s.id, "subscriber queue saturated, dropping slow subscriber");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    async fn run(self: Arc<Self>) {
        info!(session = %self.id, backend = self.backend.name(), "stream session started");
        let mut timer = FrameTimer::new(self.target_fps);

        loop {
            if self.state() == SessionState::Stopped {
                break;
            }
            if self.state() == SessionState::Paused {
                self.resume_notify.notified().await;
                continue;
            }

            timer.begin_cycle();
            if self.frame_skip_enabled && timer.should_skip() {
                self.metrics.lock().unwrap().record_skipped();
                timer.sleep_until_next().await;
                continue;
            }

            let capture_started = Instant::now();
            let raw = match self.capture_with_retry().await {
                Ok(raw) => raw,
                Err(e) if e.category() == "capture_fatal" => {
                    warn!(session = %self.id, error = %e, "backend fatal, stopping session");
                    self.metrics.lock().unwrap().record_dropped();
                    let mut state = self.state.lock().unwrap();
                    *state = SessionState::Stopped;
                    drop(state);
                    self.broadcast(SessionEvent::Stopped {
                        reason: format!("capture backend failed: {e}"),
                    });
                    break;
                }
                Err(e) => {
                    debug!(session = %self.id, error = %e, "frame dropped");
                    self.metrics.lock().unwrap().record_dropped();
                    timer.sleep_until_next().await;
                    continue;
                }
            };
            let capture_ms = capture_started.elapsed().as_secs_f64() * 1000.0;

            let quality = self.quality.lock().unwrap().current_quality();
            let encode_started = Instant::now();
            let encoded = match self.encoder.encode(&raw, self.format, quality).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(session = %self.id, error = %e, "encode failed, frame dropped");
                    self.metrics.lock().unwrap().record_dropped();
                    timer.sleep_until_next().await;
                    continue;
                }
            };
            let encode_ms = encode_started.elapsed().as_secs_f64() * 1000.0;

            let publish_started = Instant::now();
            let uri = ResourceCache::derive_uri(
                raw.monotonic_capture_ns,
                self.backend.name(),
                raw.width,
                raw.height,
            );
            let uri = self.cache.insert(
                uri,
                crate::core::EncodedFrame {
                    bytes: encoded,
                    mime: self.format,
                    metadata: crate::core::FrameMetadata {
                        width: raw.width,
                        height: raw.height,
                        quality,
                        captured_at_unix_ms: Utc::now().timestamp_millis() as u64,
                        source: self.backend.name().to_string(),
                    },
                },
            );
            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
            self.broadcast(SessionEvent::FrameReady {
                uri,
                mime: self.format.as_str(),
                width: raw.width,
                height: raw.height,
                quality,
                sequence,
            });
            let publish_ms = publish_started.elapsed().as_secs_f64() * 1000.0;

            {
                let mut metrics = self.metrics.lock().unwrap();
                metrics.record_processed(capture_ms, encode_ms, publish_ms);
                let fps = metrics.recent_fps();
                drop(metrics);

                if self.adaptive_quality_enabled {
                    let mut ctrl = self.quality.lock().unwrap();
                    if ctrl.tick() {
                        // CPU headroom is not sampled at this layer; treat
                        // as unconstrained so the fps-based rule alone
                        // drives the adjustment.
                        ctrl.observe(fps, self.target_fps as f64, 0.0);
                    }
                }
            }

            timer.mark_processed();
            timer.sleep_until_next().await;
        }
        info!(session = %self.id, "producer task exited");
    }

    async fn capture_with_retry(&self) -> CaptureResult<crate::capture::RawFrame> {
        match self.backend.capture(&self.source, self.region).await {
            Ok(frame) => Ok(frame),
            Err(e) if e.category() == "frame_capture" => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                self.backend.capture(&self.source, self.region).await
            }
            Err(e) => Err(e),
        }
    }
}

/// Fluent builder-style constructor for [`StreamSession`].
pub struct StreamSessionBuilder {
    source: CaptureSource,
    backend: Arc<dyn CaptureBackend>,
    encoder: Arc<dyn Encoder>,
    cache: Arc<ResourceCache>,
    region: Option<Region>,
    format: Mime,
    target_fps: u32,
    start_quality: u32,
    min_quality: u32,
    max_quality: u32,
    frame_skip_enabled: bool,
    adaptive_quality_enabled: bool,
}

impl StreamSessionBuilder {
    pub fn new(
        source: CaptureSource,
        backend: Arc<dyn CaptureBackend>,
        encoder: Arc<dyn Encoder>,
        cache: Arc<ResourceCache>,
    ) -> Self {
        Self {
            source,
            backend,
            encoder,
            cache,
            region: None,
            format: Mime::Jpeg,
            target_fps: 10,
            start_quality: 80,
            min_quality: 1,
            max_quality: 100,
            frame_skip_enabled: true,
            adaptive_quality_enabled: false,
        }
    }

    pub fn with_region(mut self, region: Option<Region>) -> Self {
        self.region = region;
        self
    }

    pub fn with_format(mut self, format: Mime) -> Self {
        self.format = format;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    pub fn with_quality(mut self, start: u32, min: u32, max: u32) -> Self {
        self.start_quality = start;
        self.min_quality = min;
        self.max_quality = max;
        self
    }

    pub fn with_frame_skip(mut self, enabled: bool) -> Self {
        self.frame_skip_enabled = enabled;
        self
    }

    pub fn with_adaptive_quality(mut self, enabled: bool) -> Self {
        self.adaptive_quality_enabled = enabled;
        self
    }

    pub fn build(self) -> Arc<StreamSession> {
        Arc::new(StreamSession {
            id: Uuid::new_v4(),
            source: self.source,
            region: self.region,
            format: self.format,
            target_fps: self.target_fps,
            frame_skip_enabled: self.frame_skip_enabled,
            adaptive_quality_enabled: self.adaptive_quality_enabled,
            created_at: Utc::now(),
            backend: self.backend,
            encoder: self.encoder,
            cache: self.cache,
            state: std::sync::Mutex::new(SessionState::Created),
            resume_notify: Notify::new(),
            quality: std::sync::Mutex::new(QualityController::new(
                self.start_quality,
                self.min_quality,
                self.max_quality,
            )),
            metrics: std::sync::Mutex::new(FrameMetrics::new()),
            subscribers: std::sync::Mutex::new(Vec::new()),
            next_subscriber_id: AtomicU64::new(0),
            sequence: AtomicU64::new(0),
            task: std::sync::Mutex::new(None),
        })
    }
}
