//! # Session Module
//!
//! Per-stream pacing, adaptive quality, metrics, and the `StreamSession`
//! producer-loop state machine, plus the `StreamManager` registry that
//! enforces global limits across all running sessions.

pub mod manager;
pub mod metrics;
pub mod quality;
pub mod stream_session;
pub mod timer;

pub use manager::{StreamHandle, StreamManager};
pub use metrics::{FrameMetrics, FrameTiming, MetricsSnapshot};
pub use quality::QualityController;
pub use stream_session::{
    SessionEvent, SessionState, StreamInfo, StreamSession, StreamSessionBuilder, SubscriberId,
};
pub use timer::FrameTimer;
