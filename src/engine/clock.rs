// Frame pacing for the simulations.
//
// The render loop runs as fast as the surface presents; the simulations step
// at most `rate` times per second with a fixed `dt`, no matter how long the
// frame took.

use std::time::{Duration, Instant};

pub struct FrameClock {
    interval: Duration,
    step: f32,
    last_step: Option<Instant>,
}

impl FrameClock {
    pub fn new(rate_hz: f32, step: f32) -> Self {
        Self {
            interval: Duration::from_secs_f32(1.0 / rate_hz.max(1.0)),
            step,
            last_step: None,
        }
    }

    /// 60 Hz with a 1/60 s step.
    pub fn sixty_hz() -> Self {
        Self::new(60.0, 1.0 / 60.0)
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// `Some(dt)` when a simulation step is due at `now`.
    pub fn tick_at(&mut self, now: Instant) -> Option<f32> {
        match self.last_step {
            Some(last) if now.saturating_duration_since(last) < self.interval => None,
            _ => {
                self.last_step = Some(now);
                Some(self.step)
            }
        }
    }

    pub fn tick(&mut self) -> Option<f32> {
        self.tick_at(Instant::now())
    }

    /// Forget the last step, e.g. after a pause, so the next tick fires at once.
    pub fn reset(&mut self) {
        self.last_step = None;
    }
}

/// Rolling frame timings for the overlay, flushed once per second.
pub struct FrameStats {
    window_start: Instant,
    frames: u32,
    sum_ms: f32,
    min_ms: f32,
    max_ms: f32,
    last_frame: Option<Instant>,
    pub fps: u32,
    pub avg_ms: f32,
    pub best_ms: f32,
    pub worst_ms: f32,
}

impl FrameStats {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            sum_ms: 0.0,
            min_ms: f32::MAX,
            max_ms: 0.0,
            last_frame: None,
            fps: 0,
            avg_ms: 0.0,
            best_ms: 0.0,
            worst_ms: 0.0,
        }
    }

    /// Record a presented frame. Returns true when the published numbers changed.
    pub fn record(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_frame {
            let ms = now.saturating_duration_since(last).as_secs_f32() * 1000.0;
            self.sum_ms += ms;
            self.min_ms = self.min_ms.min(ms);
            self.max_ms = self.max_ms.max(ms);
            self.frames += 1;
        }
        self.last_frame = Some(now);

        if now.saturating_duration_since(self.window_start) < Duration::from_secs(1) {
            return false;
        }
        self.fps = self.frames;
        if self.frames > 0 {
            self.avg_ms = self.sum_ms / self.frames as f32;
            self.best_ms = self.min_ms;
            self.worst_ms = self.max_ms;
        }
        self.window_start = now;
        self.frames = 0;
        self.sum_ms = 0.0;
        self.min_ms = f32::MAX;
        self.max_ms = 0.0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_limits_step_rate() {
        let start = Instant::now();
        let mut clock = FrameClock::sixty_hz();

        assert_eq!(clock.tick_at(start), Some(1.0 / 60.0));
        assert_eq!(clock.tick_at(start + Duration::from_millis(5)), None);
        assert_eq!(clock.tick_at(start + Duration::from_millis(17)), Some(1.0 / 60.0));
        // A long stall still yields one fixed step, not a catch-up burst.
        assert_eq!(clock.tick_at(start + Duration::from_millis(500)), Some(1.0 / 60.0));
        assert_eq!(clock.tick_at(start + Duration::from_millis(501)), None);
    }

    #[test]
    fn test_reset_fires_immediately() {
        let start = Instant::now();
        let mut clock = FrameClock::sixty_hz();
        clock.tick_at(start);
        clock.reset();
        assert!(clock.tick_at(start + Duration::from_millis(1)).is_some());
    }

    #[test]
    fn test_stats_publish_each_second() {
        let start = Instant::now();
        let mut stats = FrameStats::new(start);
        for i in 0..=10 {
            let published = stats.record(start + Duration::from_millis(i * 100));
            assert_eq!(published, i == 10);
        }
        assert_eq!(stats.fps, 10);
        assert!((stats.avg_ms - 100.0).abs() < 1e-3);
        assert!((stats.worst_ms - 100.0).abs() < 1e-3);
    }
}
