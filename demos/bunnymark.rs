//! Bunnymark: up to 500,000 bouncing sprites
//!
//! Run with: cargo run --example bunnymark
//!
//! Controls:
//!   Left mouse - spawn 100 bunnies per frame at the cursor
//!   1 / 2      - individual (batched) / instanced drawing
//!   Escape     - exit
//!
//! The individual path goes through the immediate-mode sprite batch, which
//! flushes in windows of 8192 quads; the overlay shows how many draw
//! submissions that costs compared to the single instanced submission.

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
    BackendResult, Bounds, Camera, ColorPolicy, DrawMode, DrawStats, GpuMesh, GraphicsBackend,
    InstancedRenderer, LifetimePolicy, Model, SpriteBatch, SpritePipelines, SpritePopulation,
    VelocityPolicy, WgpuBackend,
};

const MAX_BUNNIES: usize = 500_000;
const SPAWN_PER_FRAME: usize = 100;
/// Height of the stats bar; bunnies bounce below it
const TOP_BAR: f32 = 40.0;
const CLEAR_COLOR: [f32; 4] = [0.96, 0.96, 0.96, 1.0];

/// White bunny silhouette, tinted per instance
const BUNNY_PNG: &[u8] = include_bytes!("assets/wabbit.png");

struct BunnymarkDemo {
    pipelines: SpritePipelines,
    texture_bind_group: BindGroupHandle,
    quad: Model,
    sprite_size: Vec2,
    bunnies: SpritePopulation,
    batch: SpriteBatch,
    renderer: InstancedRenderer,
    camera: Camera,
    mode: DrawMode,
    colors: ColorPolicy,
    velocities: VelocityPolicy,
    rng: StdRng,
    stats: DrawStats,
}

impl BunnymarkDemo {
    fn new(
        backend: &mut WgpuBackend,
        surface: (u32, u32),
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let surface_format = backend.swapchain_format();
        let pipelines = SpritePipelines::create(backend, surface_format)?;

        let texture_data = TextureData::decode(BUNNY_PNG, "wabbit")?;
        let texture = GpuTexture::create(backend, &texture_data)?;
        let texture_bind_group = pipelines.bind_texture(backend, &texture)?;

        let sprite_size = Vec2::new(texture.width as f32, texture.height as f32);
        let (vertices, indices) = sprite_quad(sprite_size);
        let quad = Model::single(GpuMesh::from_raw(
            backend,
            "bunny quad",
            bytemuck::cast_slice(&vertices),
            bytemuck::cast_slice(&indices),
            indices.len() as u32,
        )?);

        let bunnies = SpritePopulation::create(backend, MAX_BUNNIES, "bunnies")?;
        let batch = SpriteBatch::create(backend, MAX_BUNNIES)?;

        Ok(Self {
            pipelines,
            texture_bind_group,
            quad,
            sprite_size,
            bunnies,
            batch,
            renderer: InstancedRenderer::new(),
            camera: Camera::pixel_space(surface.0 as f32, surface.1 as f32),
            mode: DrawMode::Individual,
            colors: ColorPolicy::default(),
            velocities: VelocityPolicy::scatter(250.0),
            rng: StdRng::from_entropy(),
            stats: DrawStats::default(),
        })
    }

    fn bounds(&self, backend: &WgpuBackend) -> Bounds {
        let (width, height) = backend.surface_size();
        Bounds::new(
            Vec2::new(0.0, TOP_BAR),
            Vec2::new(width as f32, height as f32),
        )
    }
}

impl Demo for BunnymarkDemo {
    fn update(&mut self, backend: &mut WgpuBackend, input: &DemoInput, dt: f32) {
        if input.key_pressed(KeyCode::Digit1) {
            self.mode = DrawMode::Individual;
        }
        if input.key_pressed(KeyCode::Digit2) {
            self.mode = DrawMode::Instanced;
        }

        if input.mouse_left_down() {
            self.bunnies.spawn_burst(
                input.mouse_position(),
                SPAWN_PER_FRAME,
                &self.colors,
                &self.velocities,
                &LifetimePolicy::none(),
                &mut self.rng,
            );
        }

        let bounds = self.bounds(backend);
        self.bunnies
            .advance_bounced(dt, bounds, self.sprite_size / 2.0);

        // Re-upload the whole population every frame to apply movement
        self.bunnies.sync_to_device(backend);
    }

    fn render(&mut self, backend: &mut WgpuBackend, frame: &FrameContext) -> BackendResult<()> {
        self.pipelines
            .update_camera(backend, &self.camera.uniform_data());

        backend.begin_render_pass(&RenderPassDescriptor {
            label: Some("Bunnymark Pass".into()),
            color_attachments: vec![ColorAttachment {
                view: frame.swapchain_view,
                load_op: LoadOp::Clear(CLEAR_COLOR),
                store_op: StoreOp::Store,
            }],
            depth_stencil_attachment: None,
        });

        backend.set_viewport(0.0, 0.0, frame.width as f32, frame.height as f32, 0.0, 1.0);

        self.renderer.begin_frame();
        let count = self.bunnies.live_count() as u32;

        match self.mode {
            DrawMode::Instanced => {
                self.pipelines
                    .bind_instanced(backend, self.texture_bind_group);
                self.renderer.draw_instanced(
                    backend,
                    &self.quad,
                    self.bunnies.buffer().gpu_handle(),
                    count,
                );
            }
            DrawMode::Individual => {
                self.pipelines.bind_batched(backend, self.texture_bind_group);
                self.batch.begin();
                for bunny in self.bunnies.buffer().live() {
                    self.batch
                        .add_sprite(bunny.position, self.sprite_size, bunny.color);
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
        egui::Window::new("Bunnymark")
            .default_pos([10.0, 10.0])
            .show(ctx, |ui| {
                ui.label(format!("FPS: {fps:.1}"));
                ui.label(format!("bunnies: {}", self.bunnies.live_count()));
                ui.label(format!("mode: {}", self.mode.label()));
                ui.label(format!("draw submissions: {}", self.stats.submissions));
                if self.mode == DrawMode::Individual {
                    ui.label(format!(
                        "batched draw calls: {}",
                        SpriteBatch::submissions_for(self.bunnies.live_count())
                    ));
                }
                ui.separator();
                ui.label("LMB - spawn bunnies");
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
            title: "bunnymark instanced".to_string(),
            width: 800,
            height: 450,
            ..Default::default()
        },
        BunnymarkDemo::new,
    );
}
