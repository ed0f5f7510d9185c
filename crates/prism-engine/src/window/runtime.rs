use std::time::Duration;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, LoopState};
use crate::device::{Gpu, GpuInit};
use crate::input::{InputEvent, Key, KeyState};
use crate::time::DEFAULT_SAMPLE_INTERVAL;

use super::frame_state::FrameState;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Initial window title; replaced by frame-rate samples once rendering starts.
    pub title: String,
    pub initial_size: PhysicalSize<u32>,
    /// Minimum time between two frame-rate title updates.
    pub fps_sample_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "prism".to_string(),
            initial_size: PhysicalSize::new(800, 600),
            fps_sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, builds the app against its GPU context and runs the
    /// render loop until it closes.
    ///
    /// If window, GPU or app construction fails, the loop never renders a frame
    /// and the error is returned.
    pub fn run<A, F>(config: RuntimeConfig, gpu_init: GpuInit, build_app: F) -> Result<()>
    where
        A: CoreApp + 'static,
        F: FnOnce(&Gpu<'_>) -> Result<A>,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, build_app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.into_result()
    }
}

#[self_referencing]
struct WindowEntry {
    frame: FrameState,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A, F>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    build_app: Option<F>,

    app: Option<A>,
    window: Option<WindowEntry>,
    loop_state: LoopState,
    startup_error: Option<anyhow::Error>,
}

impl<A, F> AppState<A, F>
where
    A: CoreApp + 'static,
    F: FnOnce(&Gpu<'_>) -> Result<A>,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, build_app: F) -> Self {
        Self {
            config,
            gpu_init,
            build_app: Some(build_app),
            app: None,
            window: None,
            loop_state: LoopState::Running,
            startup_error: None,
        }
    }

    /// Whether a redraw may reach the app.
    fn rendering(&self) -> bool {
        !self.loop_state.is_closing() && self.app.is_some() && self.window.is_some()
    }

    /// Records a failed startup. The loop closes without drawing and `run`
    /// returns `err`.
    fn abort_startup(&mut self, err: anyhow::Error) {
        log::error!("startup failed: {err:#}");
        self.app = None;
        self.window = None;
        self.loop_state.request_close();
        self.startup_error = Some(err);
    }

    fn into_result(mut self) -> Result<()> {
        match self.startup_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn request_close(&mut self, event_loop: &ActiveEventLoop) {
        if !self.loop_state.is_closing() {
            log::info!("render loop closing");
        }
        self.loop_state.request_close();
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let size = window.inner_size();
        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            frame: FrameState::new(size, self.config.fps_sample_interval),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        let build_app = self
            .build_app
            .take()
            .context("application was already built")?;

        let app = entry.with_gpu(|gpu| build_app(gpu))?;

        log::info!("window {}x{} ready; entering render loop", size.width, size.height);

        entry.with_window(|w| w.request_redraw());
        self.app = Some(app);
        self.window = Some(entry);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if !self.rendering() {
            return;
        }
        let (Some(app), Some(entry)) = (self.app.as_mut(), self.window.as_mut()) else {
            return;
        };

        let loop_state = &mut self.loop_state;
        let mut control = AppControl::Continue;

        entry.with_mut(|fields| {
            if !fields.frame.begin_frame(loop_state) {
                return;
            }

            let mut ctx = FrameCtx {
                window: fields.window,
                gpu: fields.gpu,
                viewport: fields.frame.viewport(),
            };
            control = app.on_frame(&mut ctx);

            if let Some(title) = fields.frame.end_frame() {
                fields.window.set_title(&title);
            }
        });

        if control == AppControl::Exit || self.loop_state.is_closing() {
            self.request_close(event_loop);
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let Some(entry) = self.window.as_mut() else {
            return;
        };

        log::debug!("resized to {}x{}", new_size.width, new_size.height);
        entry.with_mut(|fields| {
            fields.gpu.resize(new_size);
            fields.frame.on_resize(new_size);
            fields.window.request_redraw();
        });
    }
}

impl<A, F> ApplicationHandler for AppState<A, F>
where
    A: CoreApp + 'static,
    F: FnOnce(&Gpu<'_>) -> Result<A>,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.loop_state.is_closing() {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            self.abort_startup(e);
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.loop_state.is_closing() {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; presentation (FIFO) paces the loop.
        if let Some(entry) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.loop_state.is_closing() {
            event_loop.exit();
            return;
        }

        if let Some(entry) = self.window.as_mut() {
            entry.with_mut(|fields| {
                if let Some(ev) = translate_input_event(&event) {
                    fields.frame.on_input(ev);
                }
            });
        }

        match &event {
            WindowEvent::CloseRequested => self.request_close(event_loop),

            WindowEvent::Resized(new_size) => self.resize(*new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(new_size) = self
                    .window
                    .as_ref()
                    .map(|entry| entry.with_window(|w| w.inner_size()))
                {
                    self.resize(new_size);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Drop GPU resources before the window they borrow.
        self.app = None;
        self.window = None;
        log::debug!("runtime exiting");
    }
}

fn translate_input_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::Focused(f) => Some(InputEvent::Focused(*f)),

        WindowEvent::KeyboardInput { event, .. } => {
            let state = match event.state {
                ElementState::Pressed => KeyState::Pressed,
                ElementState::Released => KeyState::Released,
            };

            Some(InputEvent::Key {
                key: map_key(event.physical_key),
                state,
            })
        }

        _ => None,
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    match pk {
        PhysicalKey::Code(KeyCode::Escape) => Key::Escape,
        PhysicalKey::Code(other) => Key::Unknown(other as u32),
        // NativeKeyCode is not a u32 in winit 0.30; preserve "unknown" without a stable numeric.
        PhysicalKey::Unidentified(_) => Key::Unknown(0),
    }
}
