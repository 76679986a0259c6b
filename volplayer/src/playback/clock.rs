/*!
    Time sources and frame pacing.
*/

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/**
    Monotonic time in seconds.
*/
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/**
    Wall clock measuring seconds since it was created.
*/
#[derive(Clone, Copy, Debug)]
pub struct WallClock {
    epoch: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/**
    Clock that only moves when told to, for deterministic playback.
*/
#[derive(Debug, Default)]
pub struct ManualClock {
    seconds: AtomicU64,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            seconds: AtomicU64::new(start.to_bits()),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.seconds.store(seconds.to_bits(), Ordering::Release);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.seconds.load(Ordering::Acquire))
    }
}

/**
    Seconds between frames; rates below 1 fps are clamped to 1.
*/
pub fn frame_period(fps: i32) -> f64 {
    1.0 / f64::from(fps.max(1))
}

/**
    Decides when the next frame is due.

    After every tick that returns true, the next presentation time lies
    strictly after `now`. When the caller falls behind, the schedule snaps
    forward instead of bursting through the missed frames.
*/
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FramePacer {
    next: f64,
}

impl FramePacer {
    pub fn new(start: f64) -> Self {
        Self { next: start }
    }

    pub fn reset(&mut self, now: f64) {
        self.next = now;
    }

    pub fn next_presentation_time(&self) -> f64 {
        self.next
    }

    /**
        Returns true if a frame is due at `now`, advancing the schedule by
        one period. The schedule advances whether or not a frame is then
        available to show.
    */
    pub fn tick(&mut self, now: f64, fps: i32) -> bool {
        if now < self.next {
            return false;
        }
        let period = frame_period(fps);
        self.next += period;
        if self.next <= now {
            self.next = now + period;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_clamps_low_rates() {
        assert_eq!(frame_period(16), 0.0625);
        assert_eq!(frame_period(0), 1.0);
        assert_eq!(frame_period(-5), 1.0);
    }

    #[test]
    fn not_due_before_next_time() {
        let mut pacer = FramePacer::new(10.0);
        assert!(!pacer.tick(9.5, 16));
        assert_eq!(pacer.next_presentation_time(), 10.0);
        assert!(pacer.tick(10.0, 16));
        assert_eq!(pacer.next_presentation_time(), 10.0625);
    }

    #[test]
    fn snaps_forward_after_a_stall() {
        let mut pacer = FramePacer::new(0.0);
        assert!(pacer.tick(5.0, 4));
        assert_eq!(pacer.next_presentation_time(), 5.25);
        assert!(!pacer.tick(5.125, 4));
    }

    #[test]
    fn next_time_always_ends_up_after_now() {
        let mut pacer = FramePacer::new(0.0);
        let mut now = 0.0;
        for step in 0..2000 {
            // uneven ticks, some well past a period
            now += [0.001, 0.013, 0.0625, 0.2][step % 4];
            let fps = [16, 30, 90, 1][step % 7 % 4];
            let before = pacer.next_presentation_time();
            if pacer.tick(now, fps) {
                assert!(pacer.next_presentation_time() > now);
            } else {
                assert_eq!(pacer.next_presentation_time(), before);
            }
        }
    }

    #[test]
    fn manual_clock_moves_on_request() {
        let clock = ManualClock::new(2.0);
        assert_eq!(clock.now(), 2.0);
        clock.advance(0.5);
        assert_eq!(clock.now(), 2.5);
        clock.set(1.0);
        assert_eq!(clock.now(), 1.0);
    }
}
