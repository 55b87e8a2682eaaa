//! Adaptive frame pacing
//!
//! The target rate climbs by one while the loop keeps up and drops by one
//! when it does not, bounded by the configured range. Measured fps is the
//! mean over the last few frame durations.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const WINDOW: usize = 10;

/// At or below this target the shell shows the low-rate indicator
pub const LOW_FPS: u32 = 20;

#[derive(Debug, Clone)]
pub struct FrameClock {
    min: u32,
    max: u32,
    target: u32,
    last: Option<Instant>,
    samples: VecDeque<Duration>,
}

impl FrameClock {
    pub fn new(min: u32, max: u32) -> Self {
        let min = min.max(1);
        let max = max.max(min);
        Self {
            min,
            max,
            target: max,
            last: None,
            samples: VecDeque::with_capacity(WINDOW),
        }
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.min, self.max)
    }

    /// Time one frame may take at the current target
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs(1) / self.target
    }

    pub fn is_low(&self) -> bool {
        self.target <= LOW_FPS
    }

    /// Record a frame start and return the measured rate, if there is one yet
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        if let Some(last) = self.last.replace(now) {
            if self.samples.len() == WINDOW {
                self.samples.pop_front();
            }
            self.samples.push_back(now.saturating_duration_since(last));
        }
        self.measured()
    }

    pub fn measured(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let total: Duration = self.samples.iter().sum();
        let mean = total.as_secs_f64() / self.samples.len() as f64;
        if mean <= 0.0 {
            return Some(self.max as f64);
        }
        Some(1.0 / mean)
    }

    /// Move the target one step toward what the loop actually achieves
    pub fn adjust(&mut self, measured: f64) {
        let before = self.target;
        if measured.round() >= self.target as f64 && self.target < self.max {
            self.target += 1;
        } else if self.target > self.min {
            self.target -= 1;
        }
        if before != self.target {
            tracing::trace!(measured, from = before, to = self.target, "Frame target changed");
        }
    }

    /// How long to sleep after a frame that started at `started`
    pub fn remaining(&self, started: Instant, now: Instant) -> Duration {
        self.frame_budget()
            .saturating_sub(now.saturating_duration_since(started))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_measures_mean_over_window() {
        let mut clock = FrameClock::new(10, 30);
        let t0 = Instant::now();
        assert_eq!(clock.tick(t0), None);

        let mut now = t0;
        for _ in 0..WINDOW {
            now += ms(50);
            clock.tick(now);
        }
        // A burst of fast frames only pulls the mean in proportion
        now += ms(10);
        let fps = clock.tick(now).unwrap();
        let mean = (ms(50) * 9 + ms(10)).as_secs_f64() / 10.0;
        assert!((fps - 1.0 / mean).abs() < 1e-6);
    }

    #[test]
    fn test_adjust_steps_within_bounds() {
        let mut clock = FrameClock::new(10, 30);
        assert_eq!(clock.target(), 30);

        // Keeping up at the top holds nothing higher, so it backs off
        clock.adjust(30.0);
        assert_eq!(clock.target(), 29);
        clock.adjust(29.4);
        assert_eq!(clock.target(), 30);

        for _ in 0..50 {
            clock.adjust(2.0);
        }
        assert_eq!(clock.target(), 10);
        assert!(clock.is_low());
    }

    #[test]
    fn test_budget_and_remaining() {
        let clock = FrameClock::new(10, 20);
        assert_eq!(clock.frame_budget(), ms(50));
        let start = Instant::now();
        assert_eq!(clock.remaining(start, start + ms(20)), ms(30));
        assert_eq!(clock.remaining(start, start + ms(80)), Duration::ZERO);
    }
}
