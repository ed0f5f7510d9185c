//! Time subsystem.
//!
//! Provides testable frame timing utilities without coupling to the runtime.
//! Intended usage:
//! - one `FrameRateReporter` per render loop, owned by the loop driver
//! - call `frame()` once per presented frame and apply returned samples

mod clock;
mod frame_rate;

pub use clock::{Clock, MonotonicClock};
pub use frame_rate::{FrameRateReporter, FrameRateSample, DEFAULT_SAMPLE_INTERVAL};
