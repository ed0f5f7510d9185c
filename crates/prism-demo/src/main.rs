mod app;

use anyhow::Result;
use winit::dpi::PhysicalSize;

use prism_engine::device::GpuInit;
use prism_engine::logging::{init_logging, LoggingConfig};
use prism_engine::window::{Runtime, RuntimeConfig};

use crate::app::TriangleApp;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "My first wgpu thing".to_string(),
        initial_size: PhysicalSize::new(800, 600),
        ..RuntimeConfig::default()
    };

    // Store shader colors unmodified rather than sRGB-encoding them.
    let gpu_init = GpuInit {
        prefer_srgb: false,
        present_mode: wgpu::PresentMode::Fifo,
    };

    Runtime::run(config, gpu_init, TriangleApp::new)?;

    log::info!("bye");
    Ok(())
}
