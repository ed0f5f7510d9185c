use std::time::Instant;

/// Source of monotonic time in seconds.
///
/// The runtime uses [`MonotonicClock`]; tests drive time manually.
pub trait Clock {
    /// Seconds elapsed since an arbitrary, fixed origin.
    fn now_secs(&self) -> f64;
}

/// Wall-clock backed by `Instant`, with its origin at construction.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_secs(&self) -> f64 {
        (**self).now_secs()
    }
}
