//! The mode signal and frame clock shared by every field.
//!
//! A scene has exactly one [`ModeController`]. The UI flips it with
//! [`ModeController::set`]; fields receive a read-only [`ModeSignal`] at
//! construction and read it at the start of every update.
//!
//! ```ignore
//! let mut mode = ModeController::new();
//! let signal = mode.signal();
//!
//! mode.set(false);
//! assert!(!signal.get());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::time::Time;

/// Read-only handle to the scene's `assembled` flag.
///
/// Cloning is cheap; every clone observes the same flag. There is no way to
/// write through a `ModeSignal`.
#[derive(Clone, Debug)]
pub struct ModeSignal {
    assembled: Arc<AtomicBool>,
}

impl ModeSignal {
    /// `true` when elements should head to their structured positions.
    #[inline]
    pub fn get(&self) -> bool {
        self.assembled.load(Ordering::Relaxed)
    }
}

/// Timing for one frame, handed to every field's update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameContext {
    /// Seconds since the scene started.
    pub elapsed: f32,
    /// Seconds since the previous frame. Finite and non-negative.
    pub delta: f32,
    /// Frame number, starting at 1 for the first advanced frame.
    pub frame: u64,
}

/// Owner of the mode flag and the frame clock.
#[derive(Debug)]
pub struct ModeController {
    assembled: Arc<AtomicBool>,
    time: Time,
}

impl ModeController {
    /// Create a controller in the assembled (structured) mode.
    pub fn new() -> Self {
        Self::with_initial(true)
    }

    /// Create a controller with an explicit starting mode.
    pub fn with_initial(assembled: bool) -> Self {
        Self {
            assembled: Arc::new(AtomicBool::new(assembled)),
            time: Time::new(),
        }
    }

    /// Set the mode. Takes effect at the start of each field's next update.
    pub fn set(&mut self, assembled: bool) {
        let previous = self.assembled.swap(assembled, Ordering::Relaxed);
        if previous != assembled {
            log::debug!("Mode set to {}", if assembled { "assembled" } else { "dispersed" });
        }
    }

    /// Flip the mode and return the new value.
    pub fn toggle(&mut self) -> bool {
        let next = !self.get();
        self.set(next);
        next
    }

    /// Current mode.
    #[inline]
    pub fn get(&self) -> bool {
        self.assembled.load(Ordering::Relaxed)
    }

    /// A read-only handle for injecting into fields.
    pub fn signal(&self) -> ModeSignal {
        ModeSignal {
            assembled: Arc::clone(&self.assembled),
        }
    }

    /// Delta time of the current frame in seconds.
    #[inline]
    pub fn delta_time(&self) -> f32 {
        self.time.delta()
    }

    /// Elapsed time in seconds.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.time.elapsed()
    }

    /// Advance the clock by a host-supplied delta.
    pub fn advance(&mut self, delta: f32) -> FrameContext {
        self.time.advance(delta);
        self.frame_context()
    }

    /// Advance the clock from the wall clock.
    pub fn tick(&mut self) -> FrameContext {
        self.time.tick();
        self.frame_context()
    }

    /// Timing for the current frame.
    pub fn frame_context(&self) -> FrameContext {
        FrameContext {
            elapsed: self.time.elapsed(),
            delta: self.time.delta(),
            frame: self.time.frame(),
        }
    }

    /// Mutable access to the clock (pause, time scale, fixed delta).
    pub fn time_mut(&mut self) -> &mut Time {
        &mut self.time
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_assembled() {
        let mode = ModeController::default();
        assert!(mode.get());
        assert!(mode.signal().get());
    }

    #[test]
    fn test_signal_sees_writes() {
        let mut mode = ModeController::new();
        let a = mode.signal();
        let b = a.clone();

        mode.set(false);
        assert!(!a.get());
        assert!(!b.get());

        assert!(mode.toggle());
        assert!(a.get());
    }

    #[test]
    fn test_advance_reports_frame() {
        let mut mode = ModeController::new();
        let frame = mode.advance(0.5);
        assert_eq!(frame.frame, 1);
        assert!((frame.delta - 0.5).abs() < 1e-6);
        assert!((mode.delta_time() - 0.5).abs() < 1e-6);
        assert!((mode.elapsed() - 0.5).abs() < 1e-6);
    }
}
