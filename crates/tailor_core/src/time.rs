use std::time::{Duration, Instant};

/// Paces the host loop. The host calls `tick()` once per frame, drains
/// asset messages, then sleeps off the rest of the frame budget.
pub struct FrameClock {
    startup: Instant,
    last_update: Instant,
    delta: Duration,
    frame_budget: Duration,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::with_frame_budget(Duration::from_millis(16))
    }
}

impl FrameClock {
    pub fn with_frame_budget(frame_budget: Duration) -> Self {
        let now = Instant::now();
        Self {
            startup: now,
            last_update: now,
            delta: Duration::ZERO,
            frame_budget,
        }
    }

    /// Called by the host loop once per frame
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last_update;
        self.last_update = now;
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed(&self) -> Duration {
        self.startup.elapsed()
    }

    /// Time left in the current frame, zero when the frame ran over.
    pub fn remaining(&self) -> Duration {
        self.frame_budget.saturating_sub(self.last_update.elapsed())
    }

    pub fn sleep_until_next_frame(&self) {
        let left = self.remaining();
        if !left.is_zero() {
            std::thread::sleep(left);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_never_exceeds_budget() {
        let clock = FrameClock::with_frame_budget(Duration::from_millis(5));
        assert!(clock.remaining() <= Duration::from_millis(5));
    }

    #[test]
    fn zero_budget_never_sleeps() {
        let mut clock = FrameClock::with_frame_budget(Duration::ZERO);
        clock.tick();
        assert!(clock.remaining().is_zero());
    }
}
