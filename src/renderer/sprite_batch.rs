//! Immediate-mode sprite batch
//!
//! Models the batching layer behind the one-draw-per-sprite path: quads
//! accumulate on the CPU and are drawn in windows of at most
//! [`MAX_BATCH_QUADS`] quads, one submission per window. A frame of `n`
//! quads therefore costs `ceil(n / 8192)` submissions - the batch boundary
//! the demos report, since it is what frame timings of the individual path
//! actually measure.

use glam::Vec2;

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::renderer::DrawStats;

/// Maximum quads per draw window
pub const MAX_BATCH_QUADS: usize = 8192;

/// CPU-accumulated quad batch with a persistent GPU vertex buffer.
pub struct SpriteBatch {
    vertices: Vec<SpriteVertex>,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    quad_capacity: usize,
}

impl SpriteBatch {
    /// `quad_capacity` bounds the quads drawable in one frame; size it to
    /// the population capacity of the demo.
    pub fn create<B: GraphicsBackend>(
        backend: &mut B,
        quad_capacity: usize,
    ) -> BackendResult<Self> {
        let vertex_buffer = backend.create_buffer(&BufferDescriptor {
            label: Some("Sprite Batch Vertices".into()),
            size: (quad_capacity * 4 * std::mem::size_of::<SpriteVertex>()) as u64,
            usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
        })?;

        // Index pattern for one full window; later windows reuse it with a
        // base-vertex offset.
        let mut indices: Vec<u32> = Vec::with_capacity(MAX_BATCH_QUADS * 6);
        for quad in 0..MAX_BATCH_QUADS as u32 {
            let base = quad * 4;
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        let index_buffer = backend.create_buffer_init(
            &BufferDescriptor {
                label: Some("Sprite Batch Indices".into()),
                size: (indices.len() * std::mem::size_of::<u32>()) as u64,
                usage: BufferUsage::INDEX,
            },
            bytemuck::cast_slice(&indices),
        )?;

        Ok(Self {
            vertices: Vec::new(),
            vertex_buffer,
            index_buffer,
            quad_capacity,
        })
    }

    /// Start a new frame of quads
    pub fn begin(&mut self) {
        self.vertices.clear();
    }

    /// Queue one axis-aligned textured quad
    pub fn add_sprite(&mut self, position: Vec2, size: Vec2, color: [u8; 4]) {
        if self.quad_count() == self.quad_capacity {
            log::warn!("sprite batch full ({} quads), dropping", self.quad_capacity);
            return;
        }
        let (x0, y0) = (position.x, position.y);
        let (x1, y1) = (position.x + size.x, position.y + size.y);
        self.vertices.extend_from_slice(&[
            SpriteVertex { position: Vec2::new(x0, y0), uv: Vec2::new(0.0, 0.0), color },
            SpriteVertex { position: Vec2::new(x0, y1), uv: Vec2::new(0.0, 1.0), color },
            SpriteVertex { position: Vec2::new(x1, y1), uv: Vec2::new(1.0, 1.0), color },
            SpriteVertex { position: Vec2::new(x1, y0), uv: Vec2::new(1.0, 0.0), color },
        ]);
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Submissions a flush of `quads` quads will issue
    pub fn submissions_for(quads: usize) -> u32 {
        quads.div_ceil(MAX_BATCH_QUADS) as u32
    }

    /// Upload the frame's vertices once, then draw them window by window.
    /// Returns the number of draw submissions issued.
    pub fn flush<B: GraphicsBackend>(&mut self, backend: &mut B, stats: &mut DrawStats) -> u32 {
        let quads = self.quad_count();
        if quads == 0 {
            return 0;
        }

        backend.write_buffer(self.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));
        backend.set_vertex_buffer(0, self.vertex_buffer, 0);
        backend.set_index_buffer(self.index_buffer, 0, IndexFormat::Uint32);

        let mut submissions = 0;
        let mut remaining = quads;
        let mut window_start = 0usize;
        while remaining > 0 {
            let window_quads = remaining.min(MAX_BATCH_QUADS);
            backend.draw_indexed(
                0..(window_quads * 6) as u32,
                (window_start * 4) as i32,
                0..1,
            );
            submissions += 1;
            window_start += window_quads;
            remaining -= window_quads;
        }

        stats.submissions += submissions;
        stats.instances += quads as u32;
        submissions
    }

    pub fn destroy<B: GraphicsBackend>(self, backend: &mut B) {
        backend.destroy_buffer(self.vertex_buffer);
        backend.destroy_buffer(self.index_buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_count_follows_batch_windows() {
        assert_eq!(SpriteBatch::submissions_for(0), 0);
        assert_eq!(SpriteBatch::submissions_for(1), 1);
        assert_eq!(SpriteBatch::submissions_for(MAX_BATCH_QUADS), 1);
        assert_eq!(SpriteBatch::submissions_for(MAX_BATCH_QUADS + 1), 2);
        assert_eq!(SpriteBatch::submissions_for(20_000), 3);
    }
}
