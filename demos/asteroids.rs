//! Asteroid field: 50,000 rocks orbiting a planet
//!
//! Run with: cargo run --example asteroids
//!
//! Controls:
//!   1 / 2    - individual / instanced drawing
//!   WASD     - fly, Space/LShift up/down, LCtrl sprint
//!   Mouse    - look around, scroll zooms
//!   R        - reset camera
//!   F3       - pause and release the cursor
//!   Escape   - exit

use glam::{Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use winit::keyboard::KeyCode;

use instancing_demos::backend::traits::{
    ColorAttachment, DepthStencilAttachment, FrameContext, LoadOp, RenderPassDescriptor, StoreOp,
};
use instancing_demos::demo::{self, Demo, DemoConfig, DemoInput};
use instancing_demos::resources::Mesh;
use instancing_demos::{
    BackendResult, Camera, DepthTarget, DrawMode, DrawStats, FreeLookCamera, GpuMesh,
    GraphicsBackend, InstanceBuffer, InstancedRenderer, MeshPipeline, Model, Projection,
    TransformInstance, WgpuBackend,
};

const ASTEROID_COUNT: usize = 50_000;
const FIELD_RADIUS: f32 = 150.0;
const FIELD_OFFSET: f32 = 30.0;
const CAMERA_HOME: Vec3 = Vec3::new(0.0, 0.0, 155.0);
const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];

/// Ring of semi-random rock transforms around the origin
fn asteroid_field(count: usize, rng: &mut impl Rng) -> Vec<TransformInstance> {
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;

            // Displace along the ring within [-offset, offset]; keep the
            // field flatter in Y than in X and Z.
            let x = angle.sin() * FIELD_RADIUS + rng.gen_range(-FIELD_OFFSET..FIELD_OFFSET);
            let y = rng.gen_range(-FIELD_OFFSET..FIELD_OFFSET) * 0.4;
            let z = angle.cos() * FIELD_RADIUS + rng.gen_range(-FIELD_OFFSET..FIELD_OFFSET);

            let scale = rng.gen_range(0.05..0.25);
            let rotation = rng.gen_range(0.0..std::f32::consts::TAU);

            TransformInstance::from_trs(
                Vec3::new(x, y, z),
                Vec3::new(0.4, 0.6, 0.8),
                rotation,
                scale,
            )
        })
        .collect()
}

struct AsteroidsDemo {
    pipeline: MeshPipeline,
    depth: DepthTarget,
    rock: Model,
    rocks: InstanceBuffer<TransformInstance>,
    planet: Model,
    planet_instances: InstanceBuffer<TransformInstance>,
    renderer: InstancedRenderer,
    camera: Camera,
    controller: FreeLookCamera,
    mode: DrawMode,
    paused: bool,
    stats: DrawStats,
}

impl AsteroidsDemo {
    fn new(backend: &mut WgpuBackend, surface: (u32, u32)) -> Result<Self, Box<dyn std::error::Error>> {
        let mut rng = StdRng::from_entropy();

        let surface_format = backend.swapchain_format();
        let pipeline = MeshPipeline::create(backend, surface_format)?;
        pipeline.set_base_color(backend, Vec4::ONE);
        let depth = DepthTarget::create(backend, surface.0, surface.1)?;

        let rock_mesh = Mesh::rock(1.0, 16, 10, 0.35, &mut rng);
        let rock = Model::single(GpuMesh::create(backend, &rock_mesh)?);

        let planet_mesh = Mesh::sphere(4.0, 48, 24);
        let planet = Model::single(GpuMesh::create(backend, &planet_mesh)?);

        let mut rocks = InstanceBuffer::create(backend, ASTEROID_COUNT, "asteroids")?;
        rocks.extend_from(asteroid_field(ASTEROID_COUNT, &mut rng));
        rocks.sync_to_device(backend);

        let mut planet_instances = InstanceBuffer::create(backend, 1, "planet")?;
        planet_instances.append(TransformInstance::from_translation(Vec3::ZERO));
        planet_instances.sync_to_device(backend);

        let mut camera = Camera::new(CAMERA_HOME, Vec3::ZERO);
        camera.projection = Projection::perspective(
            45.0,
            surface.0 as f32 / surface.1 as f32,
            0.1,
            1000.0,
        );

        Ok(Self {
            pipeline,
            depth,
            rock,
            rocks,
            planet,
            planet_instances,
            renderer: InstancedRenderer::new(),
            camera,
            controller: FreeLookCamera::new(CAMERA_HOME),
            mode: DrawMode::Instanced,
            paused: false,
            stats: DrawStats::default(),
        })
    }
}

impl Demo for AsteroidsDemo {
    fn update(&mut self, _backend: &mut WgpuBackend, input: &DemoInput, dt: f32) {
        if input.key_pressed(KeyCode::Digit1) {
            self.mode = DrawMode::Individual;
        }
        if input.key_pressed(KeyCode::Digit2) {
            self.mode = DrawMode::Instanced;
        }
        if input.key_pressed(KeyCode::KeyR) {
            self.controller.reset(&mut self.camera);
        }
        if input.key_pressed(KeyCode::F3) {
            self.paused = !self.paused;
        }

        if !self.paused {
            self.controller.update(&mut self.camera, &input.camera, dt);
        }
    }

    fn render(&mut self, backend: &mut WgpuBackend, frame: &FrameContext) -> BackendResult<()> {
        self.pipeline.update_camera(backend, &self.camera.uniform_data());

        backend.begin_render_pass(&RenderPassDescriptor {
            label: Some("Asteroids Pass".into()),
            color_attachments: vec![ColorAttachment {
                view: frame.swapchain_view,
                load_op: LoadOp::Clear(CLEAR_COLOR),
                store_op: StoreOp::Store,
            }],
            depth_stencil_attachment: Some(DepthStencilAttachment {
                view: self.depth.view,
                depth_load_op: LoadOp::Clear([1.0, 0.0, 0.0, 0.0]),
                depth_store_op: StoreOp::Store,
                depth_clear_value: 1.0,
            }),
        });

        backend.set_viewport(0.0, 0.0, frame.width as f32, frame.height as f32, 0.0, 1.0);
        self.pipeline.bind(backend);

        self.renderer.begin_frame();
        self.renderer.draw_instanced(
            backend,
            &self.planet,
            self.planet_instances.gpu_handle(),
            1,
        );
        self.renderer.draw(
            backend,
            self.mode,
            &self.rock,
            self.rocks.gpu_handle(),
            self.rocks.live_count() as u32,
        );
        self.stats = self.renderer.stats();

        backend.end_render_pass();
        Ok(())
    }

    fn overlay(&mut self, ctx: &egui::Context, fps: f32) {
        egui::Window::new("Asteroids")
            .default_pos([10.0, 10.0])
            .show(ctx, |ui| {
                ui.label(format!("FPS: {fps:.1}"));
                ui.label(format!("asteroids: {}", self.rocks.live_count()));
                ui.label(format!("mode: {}", self.mode.label()));
                ui.label(format!("draw submissions: {}", self.stats.submissions));
                if self.paused {
                    ui.label("paused (F3 resumes)");
                }
                ui.separator();
                ui.label("1/2 - individual/instanced");
                ui.label("WASD + mouse - fly");
                ui.label("R - reset camera, F3 - pause");
            });
    }

    fn resized(&mut self, backend: &mut WgpuBackend, width: u32, height: u32) {
        self.camera.set_aspect(width as f32, height as f32);
        if let Err(e) = self.depth.resize(backend, width, height) {
            log::error!("Failed to resize depth buffer: {e}");
        }
    }

    fn wants_cursor_captured(&self) -> bool {
        !self.paused
    }
}

fn main() {
    demo::run(
        DemoConfig {
            title: "asteroids instanced".to_string(),
            ..Default::default()
        },
        AsteroidsDemo::new,
    );
}
