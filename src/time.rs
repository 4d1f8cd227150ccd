//! Frame timing for the simulation loop.
//!
//! [`FrameClock`] turns wall-clock time into the per-step `delta_time` the
//! kernel integrates with, and reports the frame rate through `tracing`.
//!
//! ```
//! use sparkfield::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//! let dt = clock.tick();
//! assert!(dt >= 0.0);
//! assert_eq!(clock.frame(), 1);
//! ```

use std::time::{Duration, Instant};

use tracing::info;

/// Time tracking for the frame loop.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    /// Time since last frame in seconds, after clamping.
    delta_secs: f32,
    /// Longest step handed to the simulation.
    max_delta: f32,
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta_secs: 0.0,
            max_delta: 0.1,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_secs(1),
            paused: false,
        }
    }

    /// Cap a single step at `max_delta` seconds.
    ///
    /// A stalled frame (window drag, debugger) otherwise hands the kernel
    /// one huge step.
    pub fn with_max_delta(mut self, max_delta: f32) -> Self {
        self.max_delta = max_delta.max(0.0);
        self
    }

    pub fn with_fps_interval(mut self, interval: Duration) -> Self {
        self.fps_update_interval = interval;
        self
    }

    /// Advance one frame and return the step length in seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;

        self.delta_secs = if self.paused {
            0.0
        } else {
            raw_delta.min(self.max_delta)
        };

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
            info!(fps = self.fps, frame = self.frame_count, "frame rate");
        }

        self.delta_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Toggle pause state. While paused, `tick` returns 0.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert!(!clock.is_paused());
        assert_eq!(clock.delta(), 0.0);
    }

    #[test]
    fn test_tick() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        let delta = clock.tick();
        assert!(delta > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut clock = FrameClock::new().with_max_delta(0.005);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(clock.tick(), 0.005);
    }

    #[test]
    fn test_pause() {
        let mut clock = FrameClock::new();
        clock.toggle_pause();
        thread::sleep(Duration::from_millis(10));
        assert_eq!(clock.tick(), 0.0);
        assert_eq!(clock.frame(), 1);

        clock.toggle_pause();
        thread::sleep(Duration::from_millis(5));
        assert!(clock.tick() > 0.0);
    }

    #[test]
    fn test_fps_reported() {
        let mut clock = FrameClock::new().with_fps_interval(Duration::from_millis(10));
        for _ in 0..3 {
            thread::sleep(Duration::from_millis(5));
            clock.tick();
        }
        assert!(clock.fps() > 0.0);
    }
}
