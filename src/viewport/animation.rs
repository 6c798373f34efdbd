use std::time::Duration;

use crate::geometry::Point;

/// Cubic ease-out, `1 - (1 - p)^3` with `p` clamped to `[0, 1]`.
pub fn ease_out_cubic(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

/// One running transition from a captured start transform to a target.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    start_offset: Point,
    start_scale: f64,
    target_offset: Point,
    target_scale: f64,
    duration: Duration,
    elapsed: Duration,
}

impl Animation {
    pub fn new(
        start_offset: Point,
        start_scale: f64,
        target_offset: Point,
        target_scale: f64,
        duration: Duration,
    ) -> Self {
        Self {
            start_offset,
            start_scale,
            target_offset,
            target_scale,
            duration,
            elapsed: Duration::ZERO,
        }
    }

    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Advance by one frame and return the sampled `(offset, scale)`.
    pub fn step(
        &mut self,
        dt: Duration,
    ) -> (Point, f64) {
        self.elapsed = self.elapsed.saturating_add(dt);
        self.sample()
    }

    pub fn sample(&self) -> (Point, f64) {
        let eased = ease_out_cubic(self.progress());
        let offset = Point::new(
            self.start_offset.x + (self.target_offset.x - self.start_offset.x) * eased,
            self.start_offset.y + (self.target_offset.y - self.start_offset.y) * eased,
        );
        let scale = self.start_scale + (self.target_scale - self.start_scale) * eased;
        (offset, scale)
    }

    pub fn target(&self) -> (Point, f64) {
        (self.target_offset, self.target_scale)
    }
}
