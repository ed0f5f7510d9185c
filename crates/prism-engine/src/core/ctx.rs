use winit::window::Window;

use crate::coords::Viewport;
use crate::device::{Acquired, Gpu};
use crate::paint::Color;

use super::app::AppControl;

/// What an app may touch while drawing one frame.
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    /// Drawable area tracked from the latest resize.
    pub viewport: Viewport,
}

impl FrameCtx<'_, '_> {
    /// One iteration's drawing: a pass cleared to `clear` with the viewport set,
    /// handed to `draw`, then presented.
    ///
    /// A minimized window or an unavailable swapchain texture draws nothing.
    pub fn render<F>(&mut self, clear: Color, draw: F) -> AppControl
    where
        F: FnOnce(&mut wgpu::RenderPass<'_>),
    {
        if !self.viewport.is_valid() {
            return AppControl::Continue;
        }

        let mut frame = match self.gpu.acquire() {
            Acquired::Ready(frame) => frame,
            Acquired::Skipped => return AppControl::Continue,
            Acquired::Fatal => {
                log::error!("swapchain out of memory; closing");
                return AppControl::Exit;
            }
        };

        {
            let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("prism frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let [x, y, w, h, min_depth, max_depth] = self.viewport.to_pass_args();
            pass.set_viewport(x, y, w, h, min_depth, max_depth);

            draw(&mut pass);
        }

        self.window.pre_present_notify();
        self.gpu.present(frame);

        AppControl::Continue
    }
}
