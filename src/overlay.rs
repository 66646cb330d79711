//! egui overlay for debug text and frame statistics
//!
//! The overlay paints after the demo's own passes, loading (not clearing)
//! the frame rendered so far.

use egui::ViewportId;
use egui_wgpu::ScreenDescriptor;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::backend::traits::FrameContext;
use crate::backend::wgpu_backend::WgpuBackend;

/// egui context, winit input state, and the egui-wgpu renderer
pub struct EguiOverlay {
    ctx: egui::Context,
    winit_state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    paint_jobs: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
}

impl EguiOverlay {
    pub fn new(backend: &WgpuBackend, window: &Window) -> Self {
        let ctx = egui::Context::default();
        let winit_state = egui_winit::State::new(
            ctx.clone(),
            ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
        );
        let renderer =
            egui_wgpu::Renderer::new(backend.device(), backend.wgpu_surface_format(), None, 1);

        Self {
            ctx,
            winit_state,
            renderer,
            paint_jobs: Vec::new(),
            textures_delta: egui::TexturesDelta::default(),
        }
    }

    /// Feed a window event to egui. Returns true if egui consumed it.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.winit_state.on_window_event(window, event).consumed
    }

    /// Run one UI frame: collect input, build the UI, tessellate the
    /// output for [`paint`](Self::paint).
    pub fn run_ui(&mut self, window: &Window, build: impl FnOnce(&egui::Context)) {
        let raw_input = self.winit_state.take_egui_input(window);
        self.ctx.begin_frame(raw_input);

        build(&self.ctx);

        let output = self.ctx.end_frame();
        self.winit_state
            .handle_platform_output(window, output.platform_output);
        self.paint_jobs = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        self.textures_delta = output.textures_delta;
    }

    /// Paint the tessellated UI onto this frame's swapchain view
    pub fn paint(&mut self, backend: &mut WgpuBackend, frame: &FrameContext) {
        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [frame.width, frame.height],
            pixels_per_point: self.ctx.pixels_per_point(),
        };

        let (device, queue, encoder) = backend.device_queue_encoder();

        for (id, delta) in &self.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }

        if let Some(encoder) = encoder {
            self.renderer.update_buffers(
                device,
                queue,
                encoder,
                &self.paint_jobs,
                &screen_descriptor,
            );
        }

        backend.render_egui(
            &self.renderer,
            &self.paint_jobs,
            &screen_descriptor,
            frame.swapchain_view,
        );

        for id in &self.textures_delta.free {
            self.renderer.free_texture(id);
        }
        self.textures_delta = egui::TexturesDelta::default();
    }

    pub fn wants_keyboard_input(&self) -> bool {
        self.ctx.wants_keyboard_input()
    }

    pub fn wants_pointer_input(&self) -> bool {
        self.ctx.wants_pointer_input()
    }
}
