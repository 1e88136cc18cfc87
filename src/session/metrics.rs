//! # FrameMetrics
//!
//! Per-session rolling window of frame timings plus processed/dropped/skipped
//! counters. Derived values (FPS, p50/p95/p99 latency) are computed on
//! demand rather than maintained incrementally.

use serde::Serialize;
use std::collections::VecDeque;
use std::time::Instant;

const WINDOW_CAPACITY: usize = 256;

/// One frame's timing breakdown, in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct FrameTiming {
    pub capture_ms: f64,
    pub encode_ms: f64,
    pub publish_ms: f64,
    pub recorded_at: Instant,
}

impl FrameTiming {
    pub fn total_ms(&self) -> f64 {
        self.capture_ms + self.encode_ms + self.publish_ms
    }
}

/// Derived statistics computed on demand from the rolling window.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MetricsSnapshot {
    pub fps: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub processed: u64,
    pub dropped: u64,
    pub skipped: u64,
}

/// Fixed-capacity ring of recent frame timings plus lifetime counters.
pub struct FrameMetrics {
    window: VecDeque<FrameTiming>,
    processed: u64,
    dropped: u64,
    skipped: u64,
    started_at: Instant,
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(WINDOW_CAPACITY),
            processed: 0,
            dropped: 0,
            skipped: 0,
            started_at: Instant::now(),
        }
    }

    pub fn record_processed(&mut self, capture_ms: f64, encode_ms: f64, publish_ms: f64) {
        self.processed += 1;
        if self.window.len() == WINDOW_CAPACITY {
            self.window.pop_front();
        }
        self.window.push_back(FrameTiming {
            capture_ms,
            encode_ms,
            publish_ms,
            recorded_at: Instant::now(),
        });
    }

    pub fn record_dropped(&mut self) {
        self.dropped += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// `total_frames = processed + dropped + skipped`, the invariant that
    /// must hold at every moment.
    pub fn total_frames(&self) -> u64 {
        self.processed + self.dropped + self.skipped
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Observed FPS over the last 5 seconds of recorded frames.
    pub fn recent_fps(&self) -> f64 {
        self.fps_over(std::time::Duration::from_secs(5))
    }

    pub fn fps_over(&self, window: std::time::Duration) -> f64 {
        let cutoff = Instant::now() - window;
        let count = self
            .window
            .iter()
            .filter(|t| t.recorded_at >= cutoff)
            .count();
        if count == 0 {
            return 0.0;
        }
        count as f64 / window.as_secs_f64()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut totals: Vec<f64> = self.window.iter().map(|t| t.total_ms()).collect();
        totals.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let pct = |p: f64| -> f64 {
            if totals.is_empty() {
                return 0.0;
            }
            let idx = ((totals.len() as f64 - 1.0) * p).round() as usize;
            totals[idx.min(totals.len() - 1)]
        };
        MetricsSnapshot {
            fps: self.recent_fps(),
            p50_ms: pct(0.50),
            p95_ms: pct(0.95),
            p99_ms: pct(0.99),
            processed: self.processed,
            dropped: self.dropped,
            skipped: self.skipped,
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

impl Default for FrameMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_frames_invariant() {
        let mut metrics = FrameMetrics::new();
        metrics.record_processed(1.0, 1.0, 1.0);
        metrics.record_dropped();
        metrics.record_skipped();
        metrics.record_skipped();
        assert_eq!(metrics.total_frames(), 4);
        assert_eq!(metrics.processed(), 1);
        assert_eq!(metrics.dropped(), 1);
        assert_eq!(metrics.skipped(), 2);
    }

    #[test]
    fn test_snapshot_percentiles_monotone() {
        let mut metrics = FrameMetrics::new();
        for ms in [5.0, 10.0, 15.0, 20.0, 100.0] {
            metrics.record_processed(ms / 3.0, ms / 3.0, ms / 3.0);
        }
        let snap = metrics.snapshot();
        assert!(snap.p50_ms <= snap.p95_ms);
        assert!(snap.p95_ms <= snap.p99_ms);
    }

    #[test]
    fn test_empty_snapshot_has_zero_percentiles() {
        let metrics = FrameMetrics::new();
        let snap = metrics.snapshot();
        assert_eq!(snap.p50_ms, 0.0);
        assert_eq!(snap.processed, 0);
    }
}
