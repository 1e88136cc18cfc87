//! # QualityController
//!
//! Adaptive quality adjustment, evaluated every N frames against observed
//! FPS and CPU headroom, with hysteresis applied only at interval
//! boundaries so quality never oscillates frame-to-frame.

/// Per-session adaptive quality controller.
pub struct QualityController {
    min_quality: u32,
    max_quality: u32,
    current_quality: u32,
    interval_frames: u32,
    frames_since_adjustment: u32,
}

impl QualityController {
    pub fn new(start_quality: u32, min_quality: u32, max_quality: u32) -> Self {
        Self {
            min_quality,
            max_quality,
            current_quality: start_quality.clamp(min_quality, max_quality),
            interval_frames: 10,
            frames_since_adjustment: 0,
        }
    }

    pub fn current_quality(&self) -> u32 {
        self.current_quality
    }

    /// Manually override the current quality, clamped to bounds. Returns
    /// the clamped value actually applied.
    pub fn set_quality(&mut self, quality: u32) -> u32 {
        self.current_quality = quality.clamp(self.min_quality, self.max_quality);
        self.current_quality
    }

    /// Record one more frame. Returns `true` if this frame crossed an
    /// interval boundary and `observe` should be called.
    pub fn tick(&mut self) -> bool {
        self.frames_since_adjustment += 1;
        if self.frames_since_adjustment >= self.interval_frames {
            self.frames_since_adjustment = 0;
            true
        } else {
            false
        }
    }

    /// Apply the adjustment rule for one interval boundary.
    ///
    /// | Condition | Adjustment |
    /// |---|---|
    /// | `current_fps < 0.85 * target_fps` | quality -= 5 (clamped) |
    /// | `current_fps >= 0.95 * target_fps && cpu_percent < 60` | quality += 2 (clamped) |
    /// | `cpu_percent > 80` | hold |
    pub fn observe(&mut self, current_fps: f64, target_fps: f64, cpu_percent: f64) {
        if cpu_percent > 80.0 {
            return;
        }
        if current_fps < 0.85 * target_fps {
            self.current_quality = self.current_quality.saturating_sub(5).max(self.min_quality);
        } else if current_fps >= 0.95 * target_fps && cpu_percent < 60.0 {
            self.current_quality = (self.current_quality + 2).min(self.max_quality);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrades_under_sustained_low_fps() {
        let mut ctrl = QualityController::new(60, 30, 90);
        ctrl.observe(40.0, 60.0, 50.0);
        assert_eq!(ctrl.current_quality(), 55);
    }

    #[test]
    fn test_improves_when_fps_and_cpu_headroom_are_good() {
        let mut ctrl = QualityController::new(60, 30, 90);
        ctrl.observe(59.0, 60.0, 40.0);
        assert_eq!(ctrl.current_quality(), 62);
    }

    #[test]
    fn test_holds_under_high_cpu() {
        let mut ctrl = QualityController::new(60, 30, 90);
        ctrl.observe(40.0, 60.0, 85.0);
        assert_eq!(ctrl.current_quality(), 60);
    }

    #[test]
    fn test_clamped_at_bounds() {
        let mut ctrl = QualityController::new(32, 30, 90);
        ctrl.observe(10.0, 60.0, 10.0);
        assert_eq!(ctrl.current_quality(), 30);

        let mut ctrl = QualityController::new(89, 30, 90);
        ctrl.observe(60.0, 60.0, 10.0);
        assert_eq!(ctrl.current_quality(), 90);
    }

    #[test]
    fn test_set_quality_clamps_to_bounds() {
        let mut ctrl = QualityController::new(60, 30, 90);
        assert_eq!(ctrl.set_quality(120), 90);
        assert_eq!(ctrl.set_quality(5), 30);
        assert_eq!(ctrl.set_quality(50), 50);
    }

    #[test]
    fn test_tick_fires_every_n_frames() {
        let mut ctrl = QualityController::new(60, 30, 90);
        for _ in 0..9 {
            assert!(!ctrl.tick());
        }
        assert!(ctrl.tick());
    }
}
