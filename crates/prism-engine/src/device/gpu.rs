use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Frames the presentation engine may queue ahead of the GPU.
const FRAME_LATENCY: u32 = 2;

/// Surface choices made once at startup.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Pick an sRGB swapchain format when one exists. When false, a linear
    /// format is preferred so fragment outputs reach the screen unchanged.
    pub prefer_srgb: bool,

    /// `Fifo` blocks presentation on vertical sync.
    pub present_mode: wgpu::PresentMode,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
        }
    }
}

/// What to do after the swapchain refused to hand out a texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Recovery {
    /// Configure the surface again and try on the next redraw.
    Reconfigure,
    /// Drop this frame only.
    Skip,
    /// Stop the render loop.
    Fatal,
}

impl Recovery {
    pub fn for_error(err: &SurfaceError) -> Self {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => Recovery::Reconfigure,
            SurfaceError::Timeout | SurfaceError::Other => Recovery::Skip,
            SurfaceError::OutOfMemory => Recovery::Fatal,
        }
    }
}

/// Swapchain texture being drawn this iteration, with its encoder.
pub struct Frame {
    texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// Outcome of [`Gpu::acquire`].
pub enum Acquired {
    Ready(Frame),
    Skipped,
    Fatal,
}

/// Device, queue and the window's swapchain.
///
/// `'w` ties the surface to the window it presents into.
pub struct Gpu<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
}

impl<'w> Gpu<'w> {
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .context("no GPU adapter can present to this window")?;

        let info = adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("prism device"),
                ..Default::default()
            })
            .await
            .context("failed to open GPU device")?;

        let caps = surface.get_capabilities(&adapter);
        let format = pick_format(&caps.formats, init.prefer_srgb)
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: FRAME_LATENCY,
        };
        surface.configure(&device, &config);
        log::debug!("swapchain {format:?} {}x{}", size.width, size.height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Follows the window size. A zero dimension leaves the swapchain as it is
    /// until the window is restored.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Takes the next swapchain texture, recovering from a stale surface.
    pub fn acquire(&mut self) -> Acquired {
        let texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(err) => {
                log::debug!("swapchain texture unavailable: {err}");
                return match Recovery::for_error(&err) {
                    Recovery::Reconfigure => {
                        self.surface.configure(&self.device, &self.config);
                        Acquired::Skipped
                    }
                    Recovery::Skip => Acquired::Skipped,
                    Recovery::Fatal => Acquired::Fatal,
                };
            }
        };

        let view = texture.texture.create_view(&Default::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("prism frame"),
            });

        Acquired::Ready(Frame {
            texture,
            view,
            encoder,
        })
    }

    /// Submits the recorded commands and swaps the frame onto the screen.
    pub fn present(&self, frame: Frame) {
        let Frame {
            texture, encoder, ..
        } = frame;
        self.queue.submit([encoder.finish()]);
        texture.present();
    }
}

/// First format whose sRGB-ness matches the preference, else the first one offered.
fn pick_format(formats: &[wgpu::TextureFormat], srgb: bool) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .find(|f| f.is_srgb() == srgb)
        .or(formats.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    #[test]
    fn linear_format_preferred_when_srgb_disabled() {
        let offered = [F::Bgra8UnormSrgb, F::Bgra8Unorm];
        assert_eq!(pick_format(&offered, false), Some(F::Bgra8Unorm));
        assert_eq!(pick_format(&offered, true), Some(F::Bgra8UnormSrgb));
    }

    #[test]
    fn first_format_when_preference_unavailable() {
        assert_eq!(pick_format(&[F::Rgba8UnormSrgb], false), Some(F::Rgba8UnormSrgb));
        assert_eq!(pick_format(&[], false), None);
    }

    #[test]
    fn stale_surface_is_reconfigured() {
        assert_eq!(Recovery::for_error(&SurfaceError::Lost), Recovery::Reconfigure);
        assert_eq!(Recovery::for_error(&SurfaceError::Outdated), Recovery::Reconfigure);
    }

    #[test]
    fn only_out_of_memory_stops_the_loop() {
        assert_eq!(Recovery::for_error(&SurfaceError::Timeout), Recovery::Skip);
        assert_eq!(Recovery::for_error(&SurfaceError::Other), Recovery::Skip);
        assert_eq!(Recovery::for_error(&SurfaceError::OutOfMemory), Recovery::Fatal);
    }
}
