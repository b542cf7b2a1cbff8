use std::f32::consts::PI;
use std::time::Duration;

/// Scale pulse that grows the surface to `scale` and back, once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomPulse {
    pub scale: f32,
    pub half_period: Duration,
}

impl ZoomPulse {
    pub fn new(scale: f32, duration_ms: u32) -> Self {
        ZoomPulse {
            scale,
            half_period: Duration::from_millis(duration_ms as u64),
        }
    }

    /// Total length: out and back.
    pub fn total(&self) -> Duration {
        self.half_period * 2
    }

    /// Scale factor `elapsed` into the pulse, or `None` once it has finished.
    pub fn scale_at(&self, elapsed: Duration) -> Option<f32> {
        if elapsed >= self.total() {
            return None;
        }
        let half = self.half_period.as_secs_f32();
        if half <= 0.0 {
            return None;
        }
        let t = elapsed.as_secs_f32() / half;
        // Second half plays the first in reverse.
        let t = if t > 1.0 { 2.0 - t } else { t };
        Some(1.0 + (self.scale - 1.0) * ease(t))
    }
}

/// Accelerate-decelerate easing on [0, 1].
fn ease(t: f32) -> f32 {
    0.5 - (PI * t.clamp(0.0, 1.0)).cos() * 0.5
}
