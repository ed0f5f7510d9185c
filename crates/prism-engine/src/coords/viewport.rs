use winit::dpi::PhysicalSize;

/// Drawable rectangle of the render target in physical pixels.
///
/// The rasterizer maps NDC `[-1, 1]` onto this rectangle. The runtime keeps it
/// equal to `(0, 0, width, height)` of the current surface size.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Full-surface viewport anchored at the origin.
    #[inline]
    pub const fn from_size(size: PhysicalSize<u32>) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// A zero-area viewport cannot be rendered into (e.g. a minimized window).
    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Arguments for `wgpu::RenderPass::set_viewport` (depth range fixed to `0..1`).
    #[inline]
    pub fn to_pass_args(self) -> [f32; 6] {
        [
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
            0.0,
            1.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_sets_full_surface_viewport() {
        let vp = Viewport::from_size(PhysicalSize::new(1024, 768));
        assert_eq!(vp, Viewport::new(0, 0, 1024, 768));
        assert!(vp.is_valid());
    }

    #[test]
    fn minimized_window_is_not_drawable() {
        assert!(!Viewport::from_size(PhysicalSize::new(0, 600)).is_valid());
        assert!(!Viewport::from_size(PhysicalSize::new(800, 0)).is_valid());
    }

    #[test]
    fn pass_args_use_unit_depth_range() {
        let args = Viewport::new(0, 0, 800, 600).to_pass_args();
        assert_eq!(args, [0.0, 0.0, 800.0, 600.0, 0.0, 1.0]);
    }
}
