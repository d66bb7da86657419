//! Frame timing for the host loop.
//!
//! The store has no notion of time: one `tick()` is one step regardless of
//! how long the frame took. [`FrameClock`] is what the host uses to decide
//! whether to tick at all (pause) and to report frame rate.
//!
//! ```
//! use attractor_swarm::clock::FrameClock;
//!
//! let mut clock = FrameClock::new();
//! if clock.update() {
//!     // advance the simulation
//! }
//! assert_eq!(clock.frame(), 1);
//! ```

use std::time::{Duration, Instant};

/// Frame counter, delta time and FPS tracker.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    delta_secs: f32,
    /// Frames that advanced the simulation.
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    /// When the current pause began, if paused.
    paused_at: Option<Instant>,
    pause_elapsed: Duration,
}

impl FrameClock {
    /// Create a new clock starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused_at: None,
            pause_elapsed: Duration::ZERO,
        }
    }

    /// Record a new frame. Call once per redraw.
    ///
    /// Returns `true` if the simulation should advance this frame, i.e. the
    /// clock is not paused.
    pub fn update(&mut self) -> bool {
        let now = Instant::now();

        if self.paused_at.is_some() {
            self.delta_secs = 0.0;
            return false;
        }

        self.delta_secs = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        true
    }

    /// Seconds since start, excluding time spent paused.
    pub fn elapsed(&self) -> f32 {
        let paused_now = self
            .paused_at
            .map_or(Duration::ZERO, |at| at.elapsed());
        self.start
            .elapsed()
            .saturating_sub(self.pause_elapsed)
            .saturating_sub(paused_now)
            .as_secs_f32()
    }

    /// Seconds since the previous frame.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Frames recorded while running.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second averaged over the last half second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Frame rate implied by the last delta alone.
    #[inline]
    pub fn instant_fps(&self) -> f32 {
        if self.delta_secs > 0.0 {
            1.0 / self.delta_secs
        } else {
            0.0
        }
    }

    /// True on every `interval`-th frame. An interval of 0 never reports.
    #[inline]
    pub fn report_due(&self, interval: u64) -> bool {
        interval > 0 && self.frame_count > 0 && self.frame_count % interval == 0
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Stop advancing. `update()` returns `false` until [`resume`](Self::resume).
    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
    }

    /// Continue advancing. The next delta covers only the time since resuming.
    pub fn resume(&mut self) {
        if let Some(at) = self.paused_at.take() {
            let now = Instant::now();
            self.pause_elapsed += now.duration_since(at);
            self.last_frame = now;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
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
        assert_eq!(clock.instant_fps(), 0.0);
    }

    #[test]
    fn test_clock_update() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        assert!(clock.update());

        assert!(clock.delta() > 0.0);
        assert!(clock.instant_fps() > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_clock_pause_skips_frames() {
        let mut clock = FrameClock::new();
        clock.update();

        clock.toggle_pause();
        assert!(clock.is_paused());
        assert!(!clock.update());
        assert_eq!(clock.frame(), 1);
        assert_eq!(clock.delta(), 0.0);

        clock.toggle_pause();
        assert!(clock.update());
        assert_eq!(clock.frame(), 2);
    }

    #[test]
    fn test_report_due() {
        let mut clock = FrameClock::new();
        assert!(!clock.report_due(10));
        for _ in 0..10 {
            clock.update();
        }
        assert!(clock.report_due(10));
        assert!(clock.report_due(5));
        assert!(!clock.report_due(3));
        assert!(!clock.report_due(0));
    }

    #[test]
    fn test_elapsed_excludes_paused_time() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(20));
        clock.update();
        let before_pause = clock.elapsed();
        assert!(before_pause >= 0.02);

        clock.pause();
        thread::sleep(Duration::from_millis(100));
        let while_paused = clock.elapsed();
        assert!(while_paused - before_pause < 0.05);

        clock.resume();
        let after_resume = clock.elapsed();
        assert!(after_resume - before_pause < 0.05);
        assert!(after_resume >= before_pause);
    }

    #[test]
    fn test_pause_records_from_key_press() {
        let mut clock = FrameClock::new();
        clock.update();
        // Running time between the last frame and the pause still counts.
        thread::sleep(Duration::from_millis(60));
        let before_pause = clock.elapsed();
        clock.pause();
        clock.pause();
        thread::sleep(Duration::from_millis(100));
        clock.resume();

        assert!(clock.elapsed() >= 0.06);
        assert!(clock.elapsed() - before_pause < 0.05);
    }

    #[test]
    fn test_fps_average_after_interval() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.fps(), 0.0);
        for _ in 0..12 {
            thread::sleep(Duration::from_millis(50));
            clock.update();
        }
        // Twelve frames at ~20 Hz span more than the half-second window.
        assert!(clock.fps() > 0.0);
        assert!(clock.fps() < 25.0);
    }
}
