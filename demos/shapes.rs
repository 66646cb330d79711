//! Shape testbed: cycle primitive shapes and instance counts
//!
//! Run with: cargo run --example shapes
//!
//! Controls:
//!   Tab        - cycle shape (cube / sphere / plane / rock)
//!   Up / Down  - raise / lower the drawn instance count
//!   1 / 2      - individual / instanced drawing
//!   WASD       - fly, Space/LShift up/down, LCtrl sprint
//!   R          - reset camera
//!   F3         - pause and release the cursor
//!   Escape     - exit

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

const MAX_INSTANCES: usize = 1024;
const INITIAL_COUNT: u32 = 20;
const COUNT_STEP: u32 = 10;
const GRID_SPACING: f32 = 8.0;
const CAMERA_HOME: Vec3 = Vec3::new(0.0, 30.0, 100.0);
const CLEAR_COLOR: [f32; 4] = [0.08, 0.08, 0.1, 1.0];

/// The shapes the testbed can instance. One variant per drawable, cycled
/// at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeKind {
    Cube,
    Sphere,
    Plane,
    Rock,
}

impl ShapeKind {
    const ALL: [ShapeKind; 4] = [
        ShapeKind::Cube,
        ShapeKind::Sphere,
        ShapeKind::Plane,
        ShapeKind::Rock,
    ];

    fn label(&self) -> &'static str {
        match self {
            ShapeKind::Cube => "cube",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Plane => "plane",
            ShapeKind::Rock => "rock",
        }
    }

    fn next(&self) -> ShapeKind {
        let index = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    fn mesh(&self, rng: &mut impl Rng) -> Mesh {
        match self {
            ShapeKind::Cube => Mesh::cube(),
            ShapeKind::Sphere => Mesh::sphere(0.5, 32, 16),
            ShapeKind::Plane => Mesh::plane(1.0, 1.0, 1),
            ShapeKind::Rock => Mesh::rock(0.5, 16, 10, 0.35, rng),
        }
    }

    fn base_color(&self) -> Vec4 {
        match self {
            ShapeKind::Cube => Vec4::new(0.9, 0.5, 0.2, 1.0),
            ShapeKind::Sphere => Vec4::new(0.3, 0.6, 0.9, 1.0),
            ShapeKind::Plane => Vec4::new(0.4, 0.8, 0.4, 1.0),
            ShapeKind::Rock => Vec4::new(0.6, 0.55, 0.5, 1.0),
        }
    }
}

/// Square grid of transforms, one per possible instance slot
fn grid_transforms(count: usize, rng: &mut impl Rng) -> Vec<TransformInstance> {
    let side = (count as f32).sqrt().ceil() as usize;
    (0..count)
        .map(|i| {
            let row = (i / side) as f32;
            let col = (i % side) as f32;
            let center = (side as f32 - 1.0) / 2.0;
            let position = Vec3::new(
                (col - center) * GRID_SPACING,
                0.0,
                (row - center) * GRID_SPACING,
            );
            let rotation = rng.gen_range(0.0..std::f32::consts::TAU);
            TransformInstance::from_trs(position, Vec3::Y, rotation, 3.0)
        })
        .collect()
}

struct ShapesDemo {
    pipeline: MeshPipeline,
    depth: DepthTarget,
    model: Model,
    shape: ShapeKind,
    instances: InstanceBuffer<TransformInstance>,
    drawn_count: u32,
    renderer: InstancedRenderer,
    camera: Camera,
    controller: FreeLookCamera,
    mode: DrawMode,
    paused: bool,
    rng: StdRng,
    stats: DrawStats,
}

impl ShapesDemo {
    fn new(
        backend: &mut WgpuBackend,
        surface: (u32, u32),
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut rng = StdRng::from_entropy();

        let shape = ShapeKind::Cube;
        let surface_format = backend.swapchain_format();
        let pipeline = MeshPipeline::create(backend, surface_format)?;
        pipeline.set_base_color(backend, shape.base_color());
        let depth = DepthTarget::create(backend, surface.0, surface.1)?;

        let model = Model::single(GpuMesh::create(backend, &shape.mesh(&mut rng))?);

        let mut instances = InstanceBuffer::create(backend, MAX_INSTANCES, "shapes")?;
        instances.extend_from(grid_transforms(MAX_INSTANCES, &mut rng));
        instances.sync_to_device(backend);

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
            model,
            shape,
            instances,
            drawn_count: INITIAL_COUNT,
            renderer: InstancedRenderer::new(),
            camera,
            controller: FreeLookCamera::new(CAMERA_HOME).with_speed(30.0),
            mode: DrawMode::Individual,
            paused: false,
            rng,
            stats: DrawStats::default(),
        })
    }

    fn switch_shape(&mut self, backend: &mut WgpuBackend) {
        self.shape = self.shape.next();
        self.pipeline.set_base_color(backend, self.shape.base_color());

        match GpuMesh::create(backend, &self.shape.mesh(&mut self.rng)) {
            Ok(part) => {
                let old = std::mem::replace(&mut self.model, Model::single(part));
                old.destroy(backend);
            }
            Err(e) => log::error!("Failed to build {} mesh: {e}", self.shape.label()),
        }
    }
}

impl Demo for ShapesDemo {
    fn update(&mut self, backend: &mut WgpuBackend, input: &DemoInput, dt: f32) {
        if input.key_pressed(KeyCode::Digit1) {
            self.mode = DrawMode::Individual;
        }
        if input.key_pressed(KeyCode::Digit2) {
            self.mode = DrawMode::Instanced;
        }
        if input.key_pressed(KeyCode::Tab) {
            self.switch_shape(backend);
        }
        if input.key_pressed(KeyCode::ArrowUp) {
            self.drawn_count = (self.drawn_count + COUNT_STEP).min(MAX_INSTANCES as u32);
        }
        if input.key_pressed(KeyCode::ArrowDown) {
            self.drawn_count = self.drawn_count.saturating_sub(COUNT_STEP);
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
            label: Some("Shapes Pass".into()),
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
        self.renderer.draw(
            backend,
            self.mode,
            &self.model,
            self.instances.gpu_handle(),
            self.drawn_count.min(self.instances.live_count() as u32),
        );
        self.stats = self.renderer.stats();

        backend.end_render_pass();
        Ok(())
    }

    fn overlay(&mut self, ctx: &egui::Context, fps: f32) {
        egui::Window::new("Shapes")
            .default_pos([10.0, 10.0])
            .show(ctx, |ui| {
                ui.label(format!("FPS: {fps:.1}"));
                ui.label(format!("shape: {}", self.shape.label()));
                ui.label(format!("instances: {}", self.drawn_count));
                ui.label(format!("mode: {}", self.mode.label()));
                ui.label(format!("draw submissions: {}", self.stats.submissions));
                if self.paused {
                    ui.label("paused (F3 resumes)");
                }
                ui.separator();
                ui.label("Tab - cycle shape");
                ui.label("Up/Down - instance count");
                ui.label("1/2 - individual/instanced");
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
            title: "shapes instanced".to_string(),
            ..Default::default()
        },
        ShapesDemo::new,
    );
}
