//! Frame clock.
//!
//! Tracks elapsed time and per-frame delta. The clock can be driven by the wall
//! clock ([`Time::tick`]) or by a host render loop that already measures its own
//! frame times ([`Time::advance`]).
//!
//! # Example
//!
//! ```ignore
//! use morphfield::time::Time;
//!
//! let mut time = Time::new();
//!
//! // Host-driven loop:
//! time.advance(1.0 / 60.0);
//! assert_eq!(time.frame(), 1);
//! ```

use std::time::{Duration, Instant};

/// Longest single frame the clock reports, in seconds.
pub const MAX_DELTA: f32 = 1.0e6;

/// Elapsed time saturates here so time-driven rotations stay finite.
pub const MAX_ELAPSED: f32 = 1.0e9;

/// Frame timing shared by every field of a scene.
///
/// Delta time is always finite and non-negative; a zero delta is a legal frame
/// that produces no motion.
#[derive(Debug)]
pub struct Time {
    /// When the last wall-clock tick occurred.
    last_tick: Instant,
    /// Total elapsed time in seconds.
    elapsed_secs: f32,
    /// Time since last frame in seconds.
    delta_secs: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Whether time is paused.
    paused: bool,
    /// Fixed delta time for deterministic updates (optional).
    fixed_delta: Option<f32>,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
}

impl Time {
    /// Create a new clock starting from now.
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
        }
    }

    /// Advance using the wall clock. Call once per frame.
    ///
    /// Returns `(elapsed_time, delta_time)` for convenience.
    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let raw = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.advance(self.fixed_delta.unwrap_or(raw))
    }

    /// Advance by a host-supplied delta in seconds. Call once per frame.
    ///
    /// Negative or NaN deltas are treated as zero. Deltas are capped at
    /// [`MAX_DELTA`] after scaling and elapsed time saturates at [`MAX_ELAPSED`].
    pub fn advance(&mut self, delta: f32) -> (f32, f32) {
        self.frame_count += 1;

        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, self.delta_secs);
        }

        self.delta_secs = sanitize_delta(sanitize_delta(delta) * self.time_scale);
        self.elapsed_secs = (self.elapsed_secs + self.delta_secs).min(MAX_ELAPSED);
        (self.elapsed_secs, self.delta_secs)
    }

    /// Total elapsed time in seconds since start.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Time since last frame in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Whether time is currently paused.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current time scale multiplier.
    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Pause time progression.
    ///
    /// While paused, `delta()` returns 0 and `elapsed()` stops increasing.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume time progression after pausing.
    ///
    /// The wall-clock gap spent paused is discarded, so the first frame after
    /// resuming does not receive the whole pause as its delta.
    pub fn resume(&mut self) {
        if self.paused {
            self.last_tick = Instant::now();
            self.paused = false;
        }
    }

    /// Set a fixed delta time used by [`Time::tick`].
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.map(sanitize_delta);
    }

    /// Set time scale multiplier. Negative or NaN values clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_nan() {
            0.0
        } else {
            scale.clamp(0.0, f32::MAX)
        };
    }

    /// Elapsed time as a Duration.
    #[inline]
    pub fn elapsed_duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.elapsed_secs).unwrap_or(Duration::MAX)
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp a frame delta to `[0, MAX_DELTA]`.
pub(crate) fn sanitize_delta(delta: f32) -> f32 {
    if delta.is_nan() || delta <= 0.0 {
        0.0
    } else {
        delta.min(MAX_DELTA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_time_new() {
        let time = Time::new();
        assert_eq!(time.frame(), 0);
        assert_eq!(time.elapsed(), 0.0);
        assert!(!time.is_paused());
        assert_eq!(time.time_scale(), 1.0);
    }

    #[test]
    fn test_tick_uses_wall_clock() {
        let mut time = Time::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = time.tick();

        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
        assert_eq!(time.frame(), 1);
    }

    #[test]
    fn test_advance_accumulates() {
        let mut time = Time::new();
        for _ in 0..60 {
            time.advance(1.0 / 60.0);
        }
        assert!((time.elapsed() - 1.0).abs() < 1e-4);
        assert_eq!(time.frame(), 60);
    }

    #[test]
    fn test_negative_and_nan_delta_are_zero() {
        let mut time = Time::new();
        time.advance(-0.5);
        assert_eq!(time.delta(), 0.0);
        time.advance(f32::NAN);
        assert_eq!(time.delta(), 0.0);
        assert_eq!(time.elapsed(), 0.0);
    }

    #[test]
    fn test_pause() {
        let mut time = Time::new();
        time.advance(0.1);
        time.pause();

        let before = time.elapsed();
        time.advance(0.1);
        assert_eq!(time.elapsed(), before);
        assert_eq!(time.delta(), 0.0);

        time.resume();
        time.advance(0.1);
        assert!(time.elapsed() > before);
    }

    #[test]
    fn test_time_scale() {
        let mut time = Time::new();
        time.set_time_scale(2.0);
        time.advance(0.25);
        assert!((time.delta() - 0.5).abs() < 1e-6);

        time.set_time_scale(-1.0);
        assert_eq!(time.time_scale(), 0.0);
    }

    #[test]
    fn test_huge_deltas_stay_finite() {
        let mut time = Time::new();
        time.set_time_scale(2.0);
        for _ in 0..3 {
            let (elapsed, delta) = time.advance(f32::INFINITY);
            assert!(delta.is_finite() && delta <= MAX_DELTA);
            assert!(elapsed.is_finite() && elapsed <= MAX_ELAPSED);
        }

        time.set_time_scale(f32::INFINITY);
        time.advance(0.0);
        assert_eq!(time.delta(), 0.0);
        time.advance(f32::MAX);
        assert_eq!(time.delta(), MAX_DELTA);

        for _ in 0..2_000 {
            time.advance(f32::INFINITY);
        }
        assert_eq!(time.elapsed(), MAX_ELAPSED);
    }

    #[test]
    fn test_fixed_delta() {
        let mut time = Time::new();
        time.set_fixed_delta(Some(1.0 / 60.0));

        thread::sleep(Duration::from_millis(20));
        time.tick();

        assert!((time.delta() - 1.0 / 60.0).abs() < 0.0001);
    }
}
