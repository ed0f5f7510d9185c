use std::fmt;
use std::time::Duration;

use super::clock::{Clock, MonotonicClock};

/// Default minimum time between two samples.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(250);

/// One frame-rate measurement.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameRateSample {
    /// Frames presented per second over the sampled window.
    pub fps: f64,

    /// Average frame time in milliseconds (`1000 / fps`).
    pub frame_time_ms: f64,

    /// Frames counted in the sampled window.
    pub frames: u32,

    /// Length of the sampled window in seconds.
    pub elapsed: f64,
}

impl FrameRateSample {
    /// Window title text for this sample.
    pub fn title(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FrameRateSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FPS: {:.3} Frame Time: {:.3}(ms)", self.fps, self.frame_time_ms)
    }
}

/// Counts presented frames and periodically derives the frame rate.
///
/// Owned by the loop driver; call [`frame`](Self::frame) once per presented frame.
/// The sampling interval is a minimum: a sample is produced on the first frame
/// at or after `interval` seconds since the previous one.
#[derive(Debug)]
pub struct FrameRateReporter<C = MonotonicClock> {
    clock: C,
    interval: f64,
    last_sample: f64,
    frames: u32,
}

impl FrameRateReporter<MonotonicClock> {
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(MonotonicClock::new(), interval)
    }
}

impl<C: Clock> FrameRateReporter<C> {
    /// Creates a reporter whose first window starts at the clock's current time.
    pub fn with_clock(clock: C, interval: Duration) -> Self {
        let last_sample = clock.now_secs();
        Self {
            clock,
            interval: interval.as_secs_f64(),
            last_sample,
            frames: 0,
        }
    }

    /// Frames counted since the last sample.
    pub fn pending_frames(&self) -> u32 {
        self.frames
    }

    /// Records one presented frame; returns a sample when the interval has elapsed.
    pub fn frame(&mut self) -> Option<FrameRateSample> {
        self.frames = self.frames.saturating_add(1);

        let now = self.clock.now_secs();
        let elapsed = now - self.last_sample;
        if elapsed < self.interval || elapsed <= 0.0 {
            return None;
        }

        let fps = self.frames as f64 / elapsed;
        let sample = FrameRateSample {
            fps,
            frame_time_ms: 1000.0 / fps,
            frames: self.frames,
            elapsed,
        };

        self.last_sample = now;
        self.frames = 0;

        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Advances by a fixed step every time it is read.
    struct SteppingClock {
        t: Cell<f64>,
        step: f64,
    }

    impl SteppingClock {
        fn new(step: f64) -> Self {
            Self { t: Cell::new(0.0), step }
        }
    }

    impl Clock for SteppingClock {
        fn now_secs(&self) -> f64 {
            let now = self.t.get();
            self.t.set(now + self.step);
            now
        }
    }

    /// Only moves when told to.
    #[derive(Default)]
    struct ManualClock {
        t: Cell<f64>,
    }

    impl ManualClock {
        fn advance(&self, secs: f64) {
            self.t.set(self.t.get() + secs);
        }
    }

    impl Clock for ManualClock {
        fn now_secs(&self) -> f64 {
            self.t.get()
        }
    }

    #[test]
    fn quarter_second_steps_sample_every_frame() {
        let mut reporter = FrameRateReporter::with_clock(SteppingClock::new(0.25), DEFAULT_SAMPLE_INTERVAL);

        for _ in 0..8 {
            let sample = reporter.frame().expect("a sample per call");
            assert_eq!(sample.frames, 1);
            assert_eq!(sample.fps, 1.0 / 0.25);
            assert_eq!(sample.frame_time_ms, 250.0);
            assert_eq!(reporter.pending_frames(), 0);
        }
    }

    #[test]
    fn frames_accumulate_until_interval_elapses() {
        let clock = ManualClock::default();
        let mut reporter = FrameRateReporter::with_clock(&clock, DEFAULT_SAMPLE_INTERVAL);

        for _ in 0..9 {
            clock.advance(0.01);
            assert!(reporter.frame().is_none());
        }
        assert_eq!(reporter.pending_frames(), 9);

        clock.advance(0.17);
        let sample = reporter.frame().expect("interval reached");
        assert_eq!(sample.frames, 10);
        assert!((sample.elapsed - 0.26).abs() < 1e-9);
        assert!((sample.fps - 10.0 / 0.26).abs() < 1e-6);
        assert_eq!(reporter.pending_frames(), 0);
    }

    #[test]
    fn interval_is_a_minimum() {
        let clock = ManualClock::default();
        let mut reporter = FrameRateReporter::with_clock(&clock, DEFAULT_SAMPLE_INTERVAL);

        clock.advance(0.2);
        assert!(reporter.frame().is_none());

        clock.advance(0.3);
        let sample = reporter.frame().expect("late sample still reported");
        assert!((sample.elapsed - 0.5).abs() < 1e-9);
        assert!((sample.fps - 4.0).abs() < 1e-9);
    }

    #[test]
    fn frozen_clock_never_samples() {
        let clock = ManualClock::default();
        let mut reporter = FrameRateReporter::with_clock(&clock, Duration::ZERO);
        assert!(reporter.frame().is_none());
        assert!(reporter.frame().is_none());
        assert_eq!(reporter.pending_frames(), 2);
    }

    #[test]
    fn title_uses_three_decimals() {
        let sample = FrameRateSample {
            fps: 59.94,
            frame_time_ms: 1000.0 / 59.94,
            frames: 15,
            elapsed: 0.25,
        };
        assert_eq!(sample.title(), "FPS: 59.940 Frame Time: 16.683(ms)");
    }
}
