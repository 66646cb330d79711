//! Particles: up to 100,000 falling sprites
//!
//! Run with: cargo run --example particles
//!
//! Controls:
//!   Left mouse - spawn 100 particles per frame at the cursor
//!   1 / 2      - individual (batched) / instanced drawing
//!   Escape     - exit
//!
//! Each particle carries a lifetime that ticks down but is never consulted:
//! the population only grows until capacity, like the workload it models.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::keyboard::KeyCode;

use instancing_demos::backend::traits::{
    BindGroupHandle, ColorAttachment, FrameContext, LoadOp, RenderPassDescriptor, StoreOp,
};
use instancing_demos::demo::{self, Demo, DemoConfig, DemoInput};
use instancing_demos::resources::{sprite_quad, GpuTexture, TextureData};
use instancing_demos::{
    BackendResult, Camera, ColorPolicy, DrawMode, DrawStats, GpuMesh, GraphicsBackend,
    InstancedRenderer, LifetimePolicy, Model, SpriteBatch, SpritePipelines, SpritePopulation,
    VelocityPolicy, WgpuBackend,
};

const MAX_PARTICLES: usize = 100_000;
const SPAWN_PER_FRAME: usize = 100;
const PARTICLE_SIZE: f32 = 8.0;
const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

struct ParticlesDemo {
    pipelines: SpritePipelines,
    texture_bind_group: BindGroupHandle,
    quad: Model,
    sprite_size: Vec2,
    particles: SpritePopulation,
    batch: SpriteBatch,
    renderer: InstancedRenderer,
    camera: Camera,
    mode: DrawMode,
    colors: ColorPolicy,
    velocities: VelocityPolicy,
    lifetimes: LifetimePolicy,
    rng: StdRng,
    stats: DrawStats,
}

impl ParticlesDemo {
    fn new(
        backend: &mut WgpuBackend,
        surface: (u32, u32),
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let surface_format = backend.swapchain_format();
        let pipelines = SpritePipelines::create(backend, surface_format)?;

        let texture = GpuTexture::create(backend, &TextureData::white())?;
        let texture_bind_group = pipelines.bind_texture(backend, &texture)?;

        let sprite_size = Vec2::splat(PARTICLE_SIZE);
        let (vertices, indices) = sprite_quad(sprite_size);
        let quad = Model::single(GpuMesh::from_raw(
            backend,
            "particle quad",
            bytemuck::cast_slice(&vertices),
            bytemuck::cast_slice(&indices),
            indices.len() as u32,
        )?);

        let particles = SpritePopulation::create(backend, MAX_PARTICLES, "particles")?;
        let batch = SpriteBatch::create(backend, MAX_PARTICLES)?;

        Ok(Self {
            pipelines,
            texture_bind_group,
            quad,
            sprite_size,
            particles,
            batch,
            renderer: InstancedRenderer::new(),
            camera: Camera::pixel_space(surface.0 as f32, surface.1 as f32),
            mode: DrawMode::Instanced,
            colors: ColorPolicy::default(),
            velocities: VelocityPolicy::falling(250.0),
            lifetimes: LifetimePolicy::seconds(2.0, 10.0),
            rng: StdRng::from_entropy(),
            stats: DrawStats::default(),
        })
    }
}

impl Demo for ParticlesDemo {
    fn update(&mut self, backend: &mut WgpuBackend, input: &DemoInput, dt: f32) {
        if input.key_pressed(KeyCode::Digit1) {
            self.mode = DrawMode::Individual;
        }
        if input.key_pressed(KeyCode::Digit2) {
            self.mode = DrawMode::Instanced;
        }

        if input.mouse_left_down() {
            self.particles.spawn_burst(
                input.mouse_position(),
                SPAWN_PER_FRAME,
                &self.colors,
                &self.velocities,
                &self.lifetimes,
                &mut self.rng,
            );
        }

        self.particles.advance(dt);
        self.particles.sync_to_device(backend);
    }

    fn render(&mut self, backend: &mut WgpuBackend, frame: &FrameContext) -> BackendResult<()> {
        self.pipelines
            .update_camera(backend, &self.camera.uniform_data());

        backend.begin_render_pass(&RenderPassDescriptor {
            label: Some("Particles Pass".into()),
            color_attachments: vec![ColorAttachment {
                view: frame.swapchain_view,
                load_op: LoadOp::Clear(CLEAR_COLOR),
                store_op: StoreOp::Store,
            }],
            depth_stencil_attachment: None,
        });

        backend.set_viewport(0.0, 0.0, frame.width as f32, frame.height as f32, 0.0, 1.0);

        self.renderer.begin_frame();
        let count = self.particles.live_count() as u32;

        match self.mode {
            DrawMode::Instanced => {
                self.pipelines
                    .bind_instanced(backend, self.texture_bind_group);
                self.renderer.draw_instanced(
                    backend,
                    &self.quad,
                    self.particles.buffer().gpu_handle(),
                    count,
                );
            }
            DrawMode::Individual => {
                self.pipelines.bind_batched(backend, self.texture_bind_group);
                self.batch.begin();
                for particle in self.particles.buffer().live() {
                    self.batch
                        .add_sprite(particle.position, self.sprite_size, particle.color);
                }
                let mut batch_stats = DrawStats::default();
                self.batch.flush(backend, &mut batch_stats);
                self.renderer
                    .record_external(batch_stats.submissions, batch_stats.instances);
            }
        }

        self.stats = self.renderer.stats();
        backend.end_render_pass();
        Ok(())
    }

    fn overlay(&mut self, ctx: &egui::Context, fps: f32) {
        egui::Window::new("Particles")
            .default_pos([10.0, 10.0])
            .show(ctx, |ui| {
                ui.label(format!("FPS: {fps:.1}"));
                ui.label(format!("particles: {}", self.particles.live_count()));
                ui.label(format!("mode: {}", self.mode.label()));
                ui.label(format!("draw submissions: {}", self.stats.submissions));
                ui.separator();
                ui.label("LMB - spawn particles");
                ui.label("1/2 - individual/instanced");
            });
    }

    fn resized(&mut self, _backend: &mut WgpuBackend, width: u32, height: u32) {
        self.camera = Camera::pixel_space(width as f32, height as f32);
    }
}

fn main() {
    demo::run(
        DemoConfig {
            title: "particles instanced".to_string(),
            width: 800,
            height: 450,
            ..Default::default()
        },
        ParticlesDemo::new,
    );
}
