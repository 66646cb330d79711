//! Instanced and individual draw paths
//!
//! The point of every demo: the same population drawn either with one
//! instanced submission per mesh part, or with one submission per instance.
//! The renderer counts submissions so the difference is visible in the
//! overlay and checkable in tests.

mod pipelines;
mod sprite_batch;

pub use pipelines::*;
pub use sprite_batch::*;

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::resources::Mesh;

/// Which draw path is active. Purely a presentation-path selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// One draw submission per mesh part, geometry replicated on the GPU
    Instanced,
    /// One draw submission per instance per mesh part
    Individual,
}

impl DrawMode {
    pub fn label(&self) -> &'static str {
        match self {
            DrawMode::Instanced => "instanced",
            DrawMode::Individual => "individual",
        }
    }
}

/// Per-frame draw accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Draw submissions issued this frame
    pub submissions: u32,
    /// Instances covered by those submissions
    pub instances: u32,
}

/// GPU resources for one mesh part
pub struct GpuMesh {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_count: u32,
}

impl GpuMesh {
    /// Upload a CPU mesh
    pub fn create<B: GraphicsBackend>(backend: &mut B, mesh: &Mesh) -> BackendResult<Self> {
        Self::from_raw(
            backend,
            &mesh.name,
            mesh.vertex_bytes(),
            mesh.index_bytes(),
            mesh.index_count() as u32,
        )
    }

    /// Upload pre-packed vertex and index bytes (2D sprite quads)
    pub fn from_raw<B: GraphicsBackend>(
        backend: &mut B,
        name: &str,
        vertex_bytes: &[u8],
        index_bytes: &[u8],
        index_count: u32,
    ) -> BackendResult<Self> {
        let vertex_buffer = backend.create_buffer_init(
            &BufferDescriptor {
                label: Some(format!("{} vertices", name)),
                size: vertex_bytes.len() as u64,
                usage: BufferUsage::VERTEX,
            },
            vertex_bytes,
        )?;

        let index_buffer = backend.create_buffer_init(
            &BufferDescriptor {
                label: Some(format!("{} indices", name)),
                size: index_bytes.len() as u64,
                usage: BufferUsage::INDEX,
            },
            index_bytes,
        )?;

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count,
        })
    }

    pub fn destroy<B: GraphicsBackend>(self, backend: &mut B) {
        backend.destroy_buffer(self.vertex_buffer);
        backend.destroy_buffer(self.index_buffer);
    }
}

/// A drawable model: one or more mesh parts sharing the same pipeline.
/// Instanced drawing issues one submission per part.
pub struct Model {
    pub parts: Vec<GpuMesh>,
}

impl Model {
    pub fn single(part: GpuMesh) -> Self {
        Self { parts: vec![part] }
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn destroy<B: GraphicsBackend>(self, backend: &mut B) {
        for part in self.parts {
            part.destroy(backend);
        }
    }
}

/// Issues draw submissions against an already-bound pipeline and counts
/// them. The instance buffer must have been synced this frame; the
/// renderer only reads what is resident on the device.
pub struct InstancedRenderer {
    stats: DrawStats,
}

impl Default for InstancedRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl InstancedRenderer {
    pub fn new() -> Self {
        Self {
            stats: DrawStats::default(),
        }
    }

    /// Reset the per-frame counters
    pub fn begin_frame(&mut self) {
        self.stats = DrawStats::default();
    }

    pub fn stats(&self) -> DrawStats {
        self.stats
    }

    /// Draw `count` instances with one submission per mesh part: the
    /// instance buffer is bound as the instance-stepped stream (slot 1)
    /// and the draw covers the range `0..count`.
    ///
    /// `count == 0` issues nothing.
    pub fn draw_instanced<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        model: &Model,
        instances: BufferHandle,
        count: u32,
    ) {
        if count == 0 {
            return;
        }
        for part in &model.parts {
            backend.set_vertex_buffer(0, part.vertex_buffer, 0);
            backend.set_vertex_buffer(1, instances, 0);
            backend.set_index_buffer(part.index_buffer, 0, IndexFormat::Uint32);
            backend.draw_indexed(0..part.index_count, 0, 0..count);
            self.stats.submissions += 1;
        }
        self.stats.instances += count;
    }

    /// Draw `count` instances one at a time: one submission per instance
    /// per mesh part, each covering the single-instance range `i..i+1` of
    /// the same resident buffer. The per-object state the one-by-one path
    /// applies before each submission is carried by that bound range.
    ///
    /// `count == 0` issues nothing.
    pub fn draw_individual<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        model: &Model,
        instances: BufferHandle,
        count: u32,
    ) {
        if count == 0 {
            return;
        }
        for part in &model.parts {
            backend.set_vertex_buffer(0, part.vertex_buffer, 0);
            backend.set_vertex_buffer(1, instances, 0);
            backend.set_index_buffer(part.index_buffer, 0, IndexFormat::Uint32);
            for i in 0..count {
                backend.draw_indexed(0..part.index_count, 0, i..i + 1);
                self.stats.submissions += 1;
            }
        }
        self.stats.instances += count;
    }

    /// Dispatch on the active draw mode
    pub fn draw<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        mode: DrawMode,
        model: &Model,
        instances: BufferHandle,
        count: u32,
    ) {
        match mode {
            DrawMode::Instanced => self.draw_instanced(backend, model, instances, count),
            DrawMode::Individual => self.draw_individual(backend, model, instances, count),
        }
    }

    /// Account for submissions issued outside the renderer (sprite batch,
    /// scenery draws) so the overlay shows one total.
    pub fn record_external(&mut self, submissions: u32, instances: u32) {
        self.stats.submissions += submissions;
        self.stats.instances += instances;
    }
}

/// Depth buffer paired with the swapchain, rebuilt on resize.
pub struct DepthTarget {
    pub texture: TextureHandle,
    pub view: TextureViewHandle,
}

impl DepthTarget {
    pub fn create<B: GraphicsBackend>(
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> BackendResult<Self> {
        let texture = backend.create_texture(&TextureDescriptor {
            label: Some("Depth Buffer".into()),
            width,
            height,
            format: TextureFormat::Depth32Float,
            usage: TextureUsage::RENDER_ATTACHMENT,
        })?;
        let view = backend.create_texture_view(texture)?;
        Ok(Self { texture, view })
    }

    pub fn resize<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> BackendResult<()> {
        backend.destroy_texture(self.texture);
        let rebuilt = Self::create(backend, width, height)?;
        self.texture = rebuilt.texture;
        self.view = rebuilt.view;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support::RecordingBackend;
    use crate::instance::{InstanceBuffer, InstanceRecord, TransformInstance};
    use glam::{Vec2, Vec3};

    fn test_model(backend: &mut RecordingBackend, parts: usize) -> Model {
        let vertices = [0u8; 96];
        let indices: Vec<u32> = (0..36).collect();
        let parts = (0..parts)
            .map(|i| {
                GpuMesh::from_raw(
                    backend,
                    &format!("part {i}"),
                    &vertices,
                    bytemuck::cast_slice(&indices),
                    indices.len() as u32,
                )
                .unwrap()
            })
            .collect();
        Model { parts }
    }

    fn instance_buffer(
        backend: &mut RecordingBackend,
        count: usize,
    ) -> InstanceBuffer<TransformInstance> {
        let mut buffer = InstanceBuffer::create(backend, count.max(1), "instances").unwrap();
        buffer.extend_from(
            (0..count).map(|i| TransformInstance::from_translation(Vec3::splat(i as f32))),
        );
        buffer.sync_to_device(backend);
        buffer
    }

    #[test]
    fn instanced_path_is_one_submission_per_part_regardless_of_count() {
        for count in [1u32, 50_000] {
            let mut backend = RecordingBackend::new();
            let model = test_model(&mut backend, 1);
            let instances = instance_buffer(&mut backend, count as usize);
            let mut renderer = InstancedRenderer::new();

            renderer.begin_frame();
            renderer.draw_instanced(&mut backend, &model, instances.gpu_handle(), count);

            assert_eq!(backend.submission_count(), 1, "count = {count}");
            assert_eq!(renderer.stats().submissions, 1);
            assert_eq!(backend.draw_calls[0].instances, 0..count);
        }
    }

    #[test]
    fn instanced_path_issues_one_submission_per_mesh_part() {
        let mut backend = RecordingBackend::new();
        let model = test_model(&mut backend, 3);
        let instances = instance_buffer(&mut backend, 100);
        let mut renderer = InstancedRenderer::new();

        renderer.begin_frame();
        renderer.draw_instanced(&mut backend, &model, instances.gpu_handle(), 100);

        assert_eq!(backend.submission_count(), 3);
        for call in &backend.draw_calls {
            assert_eq!(call.instances, 0..100);
        }
    }

    #[test]
    fn individual_path_issues_one_submission_per_instance() {
        let mut backend = RecordingBackend::new();
        let model = test_model(&mut backend, 1);
        let instances = instance_buffer(&mut backend, 37);
        let mut renderer = InstancedRenderer::new();

        renderer.begin_frame();
        renderer.draw_individual(&mut backend, &model, instances.gpu_handle(), 37);

        assert_eq!(backend.submission_count(), 37);
        assert_eq!(renderer.stats().submissions, 37);
        // Each submission covers exactly its own instance slot
        for (i, call) in backend.draw_calls.iter().enumerate() {
            assert_eq!(call.instances, i as u32..i as u32 + 1);
        }
    }

    #[test]
    fn zero_count_issues_no_submissions_on_either_path() {
        let mut backend = RecordingBackend::new();
        let model = test_model(&mut backend, 2);
        let instances = instance_buffer(&mut backend, 0);
        let mut renderer = InstancedRenderer::new();

        renderer.begin_frame();
        renderer.draw_instanced(&mut backend, &model, instances.gpu_handle(), 0);
        renderer.draw_individual(&mut backend, &model, instances.gpu_handle(), 0);

        assert_eq!(backend.submission_count(), 0);
        assert_eq!(renderer.stats(), DrawStats::default());
    }

    #[test]
    fn stats_reset_each_frame() {
        let mut backend = RecordingBackend::new();
        let model = test_model(&mut backend, 1);
        let instances = instance_buffer(&mut backend, 10);
        let mut renderer = InstancedRenderer::new();

        renderer.begin_frame();
        renderer.draw_instanced(&mut backend, &model, instances.gpu_handle(), 10);
        assert_eq!(renderer.stats().submissions, 1);

        renderer.begin_frame();
        assert_eq!(renderer.stats(), DrawStats::default());
    }

    #[test]
    fn sprite_batch_flushes_in_8192_quad_windows() {
        let mut backend = RecordingBackend::new();
        let mut batch = SpriteBatch::create(&mut backend, 20_000).unwrap();
        let mut stats = DrawStats::default();

        batch.begin();
        for i in 0..20_000 {
            batch.add_sprite(Vec2::new(i as f32, 0.0), Vec2::splat(16.0), [255; 4]);
        }
        let submissions = batch.flush(&mut backend, &mut stats);

        assert_eq!(submissions, 3);
        assert_eq!(backend.submission_count(), 3);
        assert_eq!(stats.submissions, 3);
        assert_eq!(stats.instances, 20_000);

        // Full windows draw 8192 quads; the tail draws the remainder from
        // a shifted base vertex.
        assert_eq!(backend.draw_calls[0].indices, 0..8192 * 6);
        assert_eq!(backend.draw_calls[0].base_vertex, 0);
        assert_eq!(backend.draw_calls[1].base_vertex, 8192 * 4);
        assert_eq!(
            backend.draw_calls[2].indices,
            0..(20_000 - 2 * 8192) * 6
        );
        assert_eq!(backend.draw_calls[2].base_vertex, 2 * 8192 * 4);
    }

    #[test]
    fn empty_batch_flush_is_free() {
        let mut backend = RecordingBackend::new();
        let mut batch = SpriteBatch::create(&mut backend, 64).unwrap();
        let mut stats = DrawStats::default();

        batch.begin();
        assert_eq!(batch.flush(&mut backend, &mut stats), 0);
        assert_eq!(backend.submission_count(), 0);
    }

    #[test]
    fn batch_destroy_releases_both_buffers() {
        let mut backend = RecordingBackend::new();
        let batch = SpriteBatch::create(&mut backend, 64).unwrap();
        batch.destroy(&mut backend);
        assert_eq!(backend.destroyed_buffers.len(), 2);
    }

    #[test]
    fn instance_layouts_step_per_instance() {
        assert_eq!(
            TransformInstance::instance_layout().step_mode,
            crate::backend::types::VertexStepMode::Instance
        );
    }
}
