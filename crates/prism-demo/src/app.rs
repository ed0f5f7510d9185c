use anyhow::Result;

use prism_engine::core::{App, AppControl, FrameCtx};
use prism_engine::device::Gpu;
use prism_engine::render::{TriangleRenderer, CLEAR_COLOR};

/// Clears to blue and draws the orange triangle every frame.
pub struct TriangleApp {
    renderer: TriangleRenderer,
}

impl TriangleApp {
    /// Builds the pipeline against the window's surface format.
    pub fn new(gpu: &Gpu<'_>) -> Result<Self> {
        let renderer = TriangleRenderer::new(gpu.device(), gpu.surface_format())?;
        Ok(Self { renderer })
    }
}

impl App for TriangleApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let renderer = &self.renderer;
        ctx.render(CLEAR_COLOR, |pass| renderer.render(pass))
    }
}
