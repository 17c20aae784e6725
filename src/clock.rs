//! Frame scheduling.
//!
//! The frame loop asks a [`FrameClock`] for the current time before each frame
//! and then waits for the next one. [`SystemClock`] paces frames in real time;
//! [`ManualClock`] advances by a fixed step so runs are reproducible.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{PiecesError, Result};

/// A source of frame timestamps, in milliseconds.
pub trait FrameClock {
    /// Milliseconds since the clock's origin.
    fn now(&self) -> f64;

    /// Blocks (or advances) until the next frame is due.
    fn next_frame(&mut self);
}

// ============================================================================
// Manual Clock
// ============================================================================

/// A clock that only moves when told to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualClock {
    now: f64,
    step: f64,
}

impl ManualClock {
    /// Starts at zero and advances `step_ms` per frame.
    pub fn new(step_ms: f64) -> Self {
        Self::starting_at(0.0, step_ms)
    }

    pub fn starting_at(now_ms: f64, step_ms: f64) -> Self {
        Self {
            now: now_ms,
            step: step_ms,
        }
    }

    /// A clock stepping at `fps` frames per second.
    ///
    /// Fails with [`PiecesError::InvalidFrameRate`] unless `fps` is positive
    /// and finite; any other rate stalls or reverses simulated time.
    pub fn from_fps(fps: f64) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(PiecesError::InvalidFrameRate(fps));
        }
        Ok(Self::new(1000.0 / fps))
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn advance(&mut self, ms: f64) {
        self.now += ms;
    }

    pub fn set(&mut self, now_ms: f64) {
        self.now = now_ms;
    }
}

impl FrameClock for ManualClock {
    fn now(&self) -> f64 {
        self.now
    }

    fn next_frame(&mut self) {
        self.now += self.step;
    }
}

// ============================================================================
// System Clock
// ============================================================================

/// A wall-clock timer that sleeps between frames.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
    frame: Duration,
    next_due: Option<Instant>,
}

impl SystemClock {
    /// Paces frames at `fps`. A non-positive rate never sleeps.
    pub fn new(fps: f64) -> Self {
        let frame = if fps > 0.0 && fps.is_finite() {
            Duration::from_secs_f64(1.0 / fps)
        } else {
            Duration::ZERO
        };
        Self {
            origin: Instant::now(),
            frame,
            next_due: None,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(60.0)
    }
}

impl FrameClock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn next_frame(&mut self) {
        let now = Instant::now();
        let due = self.next_due.unwrap_or(now) + self.frame;
        if due > now {
            thread::sleep(due - now);
            self.next_due = Some(due);
        } else {
            // Running late: don't try to catch up with a burst of frames.
            self.next_due = Some(now);
        }
    }
}

// ============================================================================
// Stop Token
// ============================================================================

/// Cancels a running frame loop from another thread.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_steps() {
        let mut clock = ManualClock::new(16.0);
        assert_eq!(clock.now(), 0.0);
        clock.next_frame();
        clock.next_frame();
        assert_eq!(clock.now(), 32.0);
        clock.advance(8.0);
        assert_eq!(clock.now(), 40.0);
        clock.set(5.0);
        assert_eq!(clock.now(), 5.0);
    }

    #[test]
    fn manual_clock_from_fps() {
        assert_eq!(ManualClock::from_fps(50.0).unwrap().step(), 20.0);
    }

    #[test]
    fn manual_clock_rejects_unusable_rates() {
        for fps in [0.0, -30.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                ManualClock::from_fps(fps),
                Err(PiecesError::InvalidFrameRate(_))
            ));
        }
    }

    #[test]
    fn system_clock_moves_forward() {
        let mut clock = SystemClock::new(1000.0);
        let before = clock.now();
        clock.next_frame();
        clock.next_frame();
        assert!(clock.now() >= before);
        assert_eq!(clock.frame_duration(), Duration::from_millis(1));
    }

    #[test]
    fn invalid_rate_never_sleeps() {
        assert_eq!(SystemClock::new(0.0).frame_duration(), Duration::ZERO);
        assert_eq!(SystemClock::new(f64::NAN).frame_duration(), Duration::ZERO);
    }

    #[test]
    fn stop_token_is_shared() {
        let token = StopToken::new();
        let remote = token.clone();
        assert!(!token.is_cancelled());
        thread::spawn(move || remote.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }
}
