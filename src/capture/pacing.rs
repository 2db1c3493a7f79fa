//! Drift-free frame pacing for the capture loop.
//!
//! The pacer schedules iterations against an absolute `next_frame_time`
//! rather than sleeping a fixed interval, so per-frame capture jitter does
//! not accumulate. When an iteration overruns its slot the pacer does not
//! try to catch up: it resumes pacing from the current time, trading a
//! temporarily lower effective rate for smooth real-time behavior under
//! load. Catch-up would need frame dropping or buffering, which this
//! recorder avoids.

use std::time::{Duration, Instant};

/// Time source seam for the capture loop, so pacing behavior can be tested
/// with a mock clock.
pub trait Clock: Send {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// The wall clock used by live recordings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Paces loop iterations at a nominal `target_fps`.
pub struct FramePacer<C: Clock> {
    clock: C,
    frame_duration: Duration,
    next_frame_time: Instant,
}

impl<C: Clock> FramePacer<C> {
    /// `target_fps` must be positive. `next_frame_time` starts at the
    /// current time, marking the slot of the first frame.
    pub fn new(clock: C, target_fps: u32) -> Self {
        assert!(target_fps > 0, "target_fps must be positive");
        let frame_duration = Duration::from_secs_f64(1.0 / f64::from(target_fps));
        let next_frame_time = clock.now();
        Self {
            clock,
            frame_duration,
            next_frame_time,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Call once per iteration, after the frame has been captured and
    /// written. Advances the schedule by one slot and sleeps out the
    /// remainder of it. Returns `false` when the iteration overran its
    /// slot; the schedule is then reset to the present so the deficit is
    /// forgotten instead of being paid back as a frame burst.
    pub fn pace(&mut self) -> bool {
        self.next_frame_time += self.frame_duration;
        let now = self.clock.now();
        match self.next_frame_time.checked_duration_since(now) {
            Some(remaining) => {
                if !remaining.is_zero() {
                    self.clock.sleep(remaining);
                }
                true
            }
            None => {
                self.next_frame_time = now;
                false
            }
        }
    }
}
