//! Recording backend for tests
//!
//! Implements [`GraphicsBackend`] with no GPU behind it: buffer writes land
//! in CPU vectors and draw calls are recorded verbatim, so tests can assert
//! both what was uploaded and how many submissions a draw path issued.

use std::collections::HashMap;
use std::ops::Range;

use crate::backend::traits::*;
use crate::backend::types::*;

/// One recorded draw submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub indices: Range<u32>,
    pub base_vertex: i32,
    pub instances: Range<u32>,
}

#[derive(Default)]
pub struct RecordingBackend {
    next_id: u64,
    pub buffers: HashMap<u64, Vec<u8>>,
    pub draw_calls: Vec<DrawCall>,
    pub destroyed_buffers: Vec<u64>,
    in_pass: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Bytes currently stored for a buffer
    pub fn buffer_contents(&self, handle: BufferHandle) -> &[u8] {
        &self.buffers[&handle.0]
    }

    pub fn submission_count(&self) -> usize {
        self.draw_calls.len()
    }

    pub fn clear_draws(&mut self) {
        self.draw_calls.clear();
    }
}

impl GraphicsBackend for RecordingBackend {
    fn resize(&mut self, _width: u32, _height: u32) {}

    fn surface_size(&self) -> (u32, u32) {
        (800, 450)
    }

    fn begin_frame(&mut self) -> BackendResult<FrameContext> {
        Ok(FrameContext {
            swapchain_view: TextureViewHandle(0),
            width: 800,
            height: 450,
        })
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        Ok(())
    }

    fn swapchain_format(&self) -> TextureFormat {
        TextureFormat::Bgra8UnormSrgb
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        let id = self.next_id();
        self.buffers.insert(id, vec![0; desc.size as usize]);
        Ok(BufferHandle(id))
    }

    fn create_buffer_init(
        &mut self,
        _desc: &BufferDescriptor,
        data: &[u8],
    ) -> BackendResult<BufferHandle> {
        let id = self.next_id();
        self.buffers.insert(id, data.to_vec());
        Ok(BufferHandle(id))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        let contents = self.buffers.entry(buffer.0).or_default();
        let end = offset as usize + data.len();
        if contents.len() < end {
            contents.resize(end, 0);
        }
        contents[offset as usize..end].copy_from_slice(data);
    }

    fn create_texture(&mut self, _desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        Ok(TextureHandle(self.next_id()))
    }

    fn create_texture_view(&mut self, _texture: TextureHandle) -> BackendResult<TextureViewHandle> {
        Ok(TextureViewHandle(self.next_id()))
    }

    fn write_texture(&mut self, _texture: TextureHandle, _data: &[u8], _width: u32, _height: u32) {}

    fn create_sampler(&mut self, _desc: &SamplerDescriptor) -> BackendResult<SamplerHandle> {
        Ok(SamplerHandle(self.next_id()))
    }

    fn create_bind_group_layout(
        &mut self,
        _entries: &[BindGroupLayoutEntry],
    ) -> BackendResult<BindGroupLayoutHandle> {
        Ok(BindGroupLayoutHandle(self.next_id()))
    }

    fn create_bind_group(
        &mut self,
        _layout: BindGroupLayoutHandle,
        _entries: &[(u32, BindGroupEntry)],
    ) -> BackendResult<BindGroupHandle> {
        Ok(BindGroupHandle(self.next_id()))
    }

    fn create_render_pipeline(
        &mut self,
        _desc: &RenderPipelineDescriptor,
    ) -> BackendResult<RenderPipelineHandle> {
        Ok(RenderPipelineHandle(self.next_id()))
    }

    fn begin_render_pass(&mut self, _desc: &RenderPassDescriptor) {
        self.in_pass = true;
    }

    fn end_render_pass(&mut self) {
        self.in_pass = false;
    }

    fn set_render_pipeline(&mut self, _pipeline: RenderPipelineHandle) {}

    fn set_bind_group(&mut self, _index: u32, _bind_group: BindGroupHandle) {}

    fn set_vertex_buffer(&mut self, _slot: u32, _buffer: BufferHandle, _offset: u64) {}

    fn set_index_buffer(&mut self, _buffer: BufferHandle, _offset: u64, _format: IndexFormat) {}

    fn set_viewport(
        &mut self,
        _x: f32,
        _y: f32,
        _width: f32,
        _height: f32,
        _min_depth: f32,
        _max_depth: f32,
    ) {
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.draw_calls.push(DrawCall {
            indices: vertices,
            base_vertex: 0,
            instances,
        });
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.draw_calls.push(DrawCall {
            indices,
            base_vertex,
            instances,
        });
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer.0);
        self.destroyed_buffers.push(buffer.0);
    }

    fn destroy_texture(&mut self, _texture: TextureHandle) {}
}
