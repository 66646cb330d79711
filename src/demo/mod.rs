//! Generic demo harness
//!
//! One event loop serves every demo program: it owns the window, the wgpu
//! backend, input collection, the egui overlay, and the fixed
//! update-then-draw cycle. Each demo supplies scene setup and per-frame
//! behaviour through the [`Demo`] trait; the per-program `main` stays thin.

mod input;

pub use input::DemoInput;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowBuilder},
};

use crate::backend::traits::{BackendError, BackendResult, FrameContext, GraphicsBackend};
use crate::backend::wgpu_backend::WgpuBackend;
use crate::overlay::EguiOverlay;

/// Per-demo configuration
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "Instancing Demo".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// A demo program driven by [`run`]
pub trait Demo {
    /// Advance simulation and camera state. Runs strictly before `render`
    /// each frame.
    fn update(&mut self, backend: &mut WgpuBackend, input: &DemoInput, dt: f32);

    /// Record this frame's draw work. The harness has already begun the
    /// frame; the overlay renders after this returns.
    fn render(&mut self, backend: &mut WgpuBackend, frame: &FrameContext) -> BackendResult<()>;

    /// Build the overlay UI for this frame
    fn overlay(&mut self, ctx: &egui::Context, fps: f32);

    /// The surface was resized
    fn resized(&mut self, _backend: &mut WgpuBackend, _width: u32, _height: u32) {}

    /// Whether the cursor should be captured for mouse look. Polled every
    /// frame; the harness grabs or releases the cursor on change.
    fn wants_cursor_captured(&self) -> bool {
        false
    }
}

/// Sliding-window FPS counter over the last 60 frames
pub struct FpsCounter {
    frame_times: VecDeque<f32>,
    fps: f32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            frame_times: VecDeque::with_capacity(60),
            fps: 0.0,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if self.frame_times.len() >= 60 {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(dt);

        let sum: f32 = self.frame_times.iter().sum();
        if sum > 0.0 {
            self.fps = self.frame_times.len() as f32 / sum;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

/// Create the window and backend, build the demo, and drive the event loop
/// until the window closes. Startup failures are fatal and terminate before
/// the loop starts.
pub fn run<D, F>(config: DemoConfig, build: F)
where
    D: Demo + 'static,
    F: FnOnce(&mut WgpuBackend, (u32, u32)) -> Result<D, Box<dyn std::error::Error>>,
{
    env_logger::init();

    let event_loop = match EventLoop::new() {
        Ok(el) => el,
        Err(e) => {
            log::error!("Failed to create event loop: {e}");
            return;
        }
    };

    let window = match WindowBuilder::new()
        .with_title(&config.title)
        .with_inner_size(PhysicalSize::new(config.width, config.height))
        .build(&event_loop)
    {
        Ok(w) => Arc::new(w),
        Err(e) => {
            log::error!("Failed to create window: {e}");
            return;
        }
    };

    let mut backend = match WgpuBackend::new(Arc::clone(&window), config.vsync) {
        Ok(b) => b,
        Err(e) => {
            log::error!("Failed to initialize graphics backend: {e}");
            return;
        }
    };

    let surface_size = backend.surface_size();
    let mut demo = match build(&mut backend, surface_size) {
        Ok(d) => d,
        Err(e) => {
            log::error!("Failed to set up demo: {e}");
            return;
        }
    };

    let mut overlay = EguiOverlay::new(&backend, &window);
    let mut input = DemoInput::new();
    let mut fps = FpsCounter::new();
    let mut last_frame = Instant::now();
    let mut cursor_captured = false;

    let window_loop = Arc::clone(&window);
    let result = event_loop.run(move |event, elwt: &EventLoopWindowTarget<()>| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => {
                let consumed = overlay.handle_event(&window_loop, &event);
                if !consumed {
                    if let WindowEvent::KeyboardInput { event: key_event, .. } = &event {
                        if key_event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                            && key_event.state == ElementState::Pressed
                        {
                            elwt.exit();
                        }
                    }
                    input.handle_window_event(&event);
                }

                match &event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(size) => {
                        backend.resize(size.width, size.height);
                        let (w, h) = backend.surface_size();
                        demo.resized(&mut backend, w, h);
                    }
                    WindowEvent::RedrawRequested => {
                        render_frame(
                            &mut backend,
                            &mut demo,
                            &mut overlay,
                            &window_loop,
                            fps.fps(),
                        );
                    }
                    _ => {}
                }
            }
            Event::DeviceEvent { event, .. } => {
                if !overlay.wants_pointer_input() {
                    input.handle_device_event(&event);
                }
            }
            Event::AboutToWait => {
                let now = Instant::now();
                let dt = (now - last_frame).as_secs_f32();
                last_frame = now;

                fps.update(dt);

                if !overlay.wants_keyboard_input() {
                    demo.update(&mut backend, &input, dt);
                }
                input.end_frame();

                // Apply the demo's cursor capture preference
                let wants_capture = demo.wants_cursor_captured();
                if wants_capture != cursor_captured {
                    if wants_capture {
                        let _ = window_loop
                            .set_cursor_grab(CursorGrabMode::Confined)
                            .or_else(|_| window_loop.set_cursor_grab(CursorGrabMode::Locked));
                        window_loop.set_cursor_visible(false);
                    } else {
                        let _ = window_loop.set_cursor_grab(CursorGrabMode::None);
                        window_loop.set_cursor_visible(true);
                    }
                    cursor_captured = wants_capture;
                    input.set_cursor_captured(wants_capture);
                }

                window_loop.request_redraw();
            }
            _ => {}
        }
    });

    if let Err(e) = result {
        log::error!("Event loop failed: {e}");
    }
}

fn render_frame<D: Demo>(
    backend: &mut WgpuBackend,
    demo: &mut D,
    overlay: &mut EguiOverlay,
    window: &Window,
    fps: f32,
) {
    let frame = match backend.begin_frame() {
        Ok(frame) => frame,
        Err(BackendError::SurfaceLost) => {
            let (width, height) = backend.surface_size();
            backend.resize(width, height);
            return;
        }
        Err(e) => {
            log::warn!("Skipping frame: {e}");
            return;
        }
    };

    overlay.run_ui(window, |ctx| demo.overlay(ctx, fps));

    if let Err(e) = demo.render(backend, &frame) {
        log::error!("Render error: {e}");
    }

    overlay.paint(backend, &frame);

    if let Err(e) = backend.end_frame() {
        log::error!("Present error: {e}");
    }
}
