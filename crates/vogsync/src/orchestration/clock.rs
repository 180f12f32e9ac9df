//! Frame pacing
//!
//! Deadlines are `baseline + n * period`, so processing time inside a frame does
//! not accumulate. A loop that falls behind is re-baselined instead of bursting
//! to catch up.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct FrameClock {
    period: Duration,
    baseline: Instant,
    ticks: u32,
    late_ticks: u64,
}

impl FrameClock {
    pub fn new(period: Duration) -> Self {
        Self::starting_at(period, Instant::now())
    }

    pub fn starting_at(period: Duration, baseline: Instant) -> Self {
        Self {
            period,
            baseline,
            ticks: 0,
            late_ticks: 0,
        }
    }

    /// Ticks that found the loop already past its deadline
    pub fn late_ticks(&self) -> u64 {
        self.late_ticks
    }

    /// Deadline for the next frame.
    pub fn advance(&mut self) -> Instant {
        self.advance_at(Instant::now())
    }

    /// Deadline for the next frame as seen at `now`.
    pub fn advance_at(&mut self, now: Instant) -> Instant {
        self.ticks = self.ticks.saturating_add(1);
        let deadline = self.baseline + self.period * self.ticks;
        if deadline >= now {
            return deadline;
        }

        self.late_ticks += 1;
        tracing::trace!(
            "Frame loop {:?} late, re-baselining",
            now.duration_since(deadline)
        );
        self.baseline = now;
        self.ticks = 0;
        now
    }

    /// Sleep until the next frame.
    pub async fn tick(&mut self) {
        let deadline = self.advance();
        tokio::time::sleep_until(deadline).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(30);

    #[test]
    fn test_deadlines_do_not_accumulate_processing_time() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(PERIOD, start);

        // Each frame takes 10 ms of work before asking for the next deadline
        for n in 1..=5u32 {
            let now = start + PERIOD * (n - 1) + Duration::from_millis(10);
            assert_eq!(clock.advance_at(now), start + PERIOD * n);
        }
        assert_eq!(clock.late_ticks(), 0);
    }

    #[test]
    fn test_late_loop_is_rebaselined() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(PERIOD, start);

        let stalled = start + Duration::from_millis(100);
        assert_eq!(clock.advance_at(stalled), stalled);
        assert_eq!(clock.late_ticks(), 1);

        // Next deadline is one period after the stall, not a catch-up burst
        assert_eq!(clock.advance_at(stalled), stalled + PERIOD);
    }

    #[tokio::test]
    async fn test_tick_waits_about_one_period() {
        let mut clock = FrameClock::new(Duration::from_millis(20));
        let before = Instant::now();
        clock.tick().await;
        assert!(before.elapsed() >= Duration::from_millis(15));
    }
}
