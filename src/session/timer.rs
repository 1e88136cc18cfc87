//! # FrameTimer
//!
//! Per-stream pacing discipline: a standalone, testable type that never
//! anticipates the target cadence and bounds how many frames it will skip in
//! a row to catch up.

use std::time::{Duration, Instant};

/// Per-session frame pacing. One instance lives inside each `StreamSession`.
pub struct FrameTimer {
    target_interval: Duration,
    skip_threshold: Duration,
    max_consecutive_skips: u32,
    last_processed: Instant,
    cycle_start: Instant,
    consecutive_skips: u32,
}

impl FrameTimer {
    pub fn new(target_fps: u32) -> Self {
        Self::with_thresholds(target_fps, Duration::from_millis(50), 5)
    }

    pub fn with_thresholds(
        target_fps: u32,
        skip_threshold: Duration,
        max_consecutive_skips: u32,
    ) -> Self {
        let now = Instant::now();
        Self {
            target_interval: Duration::from_secs_f64(1.0 / target_fps.max(1) as f64),
            skip_threshold,
            max_consecutive_skips,
            last_processed: now,
            cycle_start: now,
            consecutive_skips: 0,
        }
    }

    /// Call once at the start of each producer loop cycle, before deciding
    /// whether to skip.
    pub fn begin_cycle(&mut self) {
        self.cycle_start = Instant::now();
    }

    /// True iff the cycle is running far enough behind cadence that it
    /// should be skipped instead of processed, and the consecutive-skip
    /// budget hasn't been exhausted. Increments the skip counter when true.
    pub fn should_skip(&mut self) -> bool {
        let behind = Instant::now().duration_since(self.last_processed) > self.target_interval + self.skip_threshold;
        if behind && self.consecutive_skips < self.max_consecutive_skips {
            self.consecutive_skips += 1;
            true
        } else {
            false
        }
    }

    /// Call after a frame is successfully produced (or forced through after
    /// exhausting the skip budget). Resets the skip run.
    pub fn mark_processed(&mut self) {
        self.last_processed = Instant::now();
        self.consecutive_skips = 0;
    }

    /// Suspend the caller so the next cycle begins at the target cadence,
    /// compensating for time already spent this cycle. Never returns early:
    /// if the cycle overran, the sleep is zero rather than negative.
    pub async fn sleep_until_next(&self) {
        let elapsed = self.cycle_start.elapsed();
        if elapsed < self.target_interval {
            tokio::time::sleep(self.target_interval - elapsed).await;
        }
    }

    pub fn target_interval(&self) -> Duration {
        self.target_interval
    }

    pub fn consecutive_skips(&self) -> u32 {
        self.consecutive_skips
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_does_not_skip_when_on_cadence() {
        let mut timer = FrameTimer::new(30);
        assert!(!timer.should_skip());
    }

    #[test]
    fn test_skips_when_behind_cadence() {
        let mut timer = FrameTimer::with_thresholds(1000, Duration::from_millis(1), 5);
        thread::sleep(Duration::from_millis(10));
        assert!(timer.should_skip());
        assert_eq!(timer.consecutive_skips(), 1);
    }

    #[test]
    fn test_bounded_consecutive_skips() {
        let mut timer = FrameTimer::with_thresholds(1000, Duration::from_millis(1), 2);
        thread::sleep(Duration::from_millis(10));
        assert!(timer.should_skip());
        assert!(timer.should_skip());
        assert!(!timer.should_skip());
    }

    #[test]
    fn test_mark_processed_resets_skip_run() {
        let mut timer = FrameTimer::with_thresholds(1000, Duration::from_millis(1), 2);
        thread::sleep(Duration::from_millis(10));
        assert!(timer.should_skip());
        timer.mark_processed();
        assert_eq!(timer.consecutive_skips(), 0);
    }

    #[tokio::test]
    async fn test_sleep_until_next_does_not_anticipate_cadence() {
        let mut timer = FrameTimer::new(100);
        timer.begin_cycle();
        let start = Instant::now();
        timer.sleep_until_next().await;
        assert!(start.elapsed() >= Duration::from_millis(8));
    }
}
