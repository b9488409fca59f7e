use std::time::{Duration, Instant};

/// Linear threshold ramp anchored at process start.
#[derive(Debug, Clone, Copy)]
pub struct Warmup {
    enabled: bool,
    duration: Duration,
    start: Instant,
}

impl Warmup {
    pub fn new(enabled: bool, duration: Duration, start: Instant) -> Self {
        Self {
            enabled,
            duration,
            start,
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, Duration::ZERO, Instant::now())
    }

    /// Factor applied to every configured maximum right now.
    pub fn factor(&self) -> f64 {
        self.factor_at(Instant::now())
    }

    pub fn factor_at(&self, now: Instant) -> f64 {
        ramp_factor(
            self.enabled,
            now.saturating_duration_since(self.start),
            self.duration,
        )
    }

    /// `max` scaled by the current factor
    pub fn effective_max(&self, max: f64) -> f64 {
        max * self.factor()
    }
}

/// 1.0 when disabled or once `elapsed >= duration`, else `elapsed / duration`.
pub fn ramp_factor(enabled: bool, elapsed: Duration, duration: Duration) -> f64 {
    if !enabled || elapsed >= duration {
        return 1.0;
    }
    elapsed.as_secs_f64() / duration.as_secs_f64()
}
