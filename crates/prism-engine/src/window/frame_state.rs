use std::time::Duration;

use winit::dpi::PhysicalSize;

use crate::coords::Viewport;
use crate::core::LoopState;
use crate::input::{InputEvent, InputState};
use crate::time::{Clock, FrameRateReporter, MonotonicClock};

/// Per-window bookkeeping of the render loop that does not touch the GPU.
///
/// The runtime feeds it window events and brackets every redraw with
/// [`begin_frame`](Self::begin_frame) and [`end_frame`](Self::end_frame).
#[derive(Debug)]
pub(crate) struct FrameState<C = MonotonicClock> {
    input: InputState,
    reporter: FrameRateReporter<C>,
    viewport: Viewport,
}

impl FrameState<MonotonicClock> {
    pub(crate) fn new(size: PhysicalSize<u32>, sample_interval: Duration) -> Self {
        Self::with_clock(MonotonicClock::new(), size, sample_interval)
    }
}

impl<C: Clock> FrameState<C> {
    pub(crate) fn with_clock(clock: C, size: PhysicalSize<u32>, sample_interval: Duration) -> Self {
        Self {
            input: InputState::default(),
            reporter: FrameRateReporter::with_clock(clock, sample_interval),
            viewport: Viewport::from_size(size),
        }
    }

    pub(crate) fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub(crate) fn on_input(&mut self, ev: InputEvent) {
        self.input.apply_event(ev);
    }

    /// Next redraw covers the whole new surface.
    pub(crate) fn on_resize(&mut self, size: PhysicalSize<u32>) {
        self.viewport = Viewport::from_size(size);
    }

    /// Runs the exit check; `false` means this iteration must not draw.
    pub(crate) fn begin_frame(&mut self, loop_state: &mut LoopState) -> bool {
        loop_state.check_input(&self.input);
        !loop_state.is_closing()
    }

    /// Counts the presented frame; returns a new window title when a sample is due.
    pub(crate) fn end_frame(&mut self) -> Option<String> {
        self.reporter.frame().map(|sample| sample.title())
    }
}
