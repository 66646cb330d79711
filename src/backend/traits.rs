//! Backend abstraction trait
//!
//! The graphics-device surface the demos draw through. The shipped
//! implementation is [`crate::backend::wgpu_backend::WgpuBackend`]; tests
//! implement the trait on a recording mock with no GPU behind it, which is
//! why construction lives on the concrete types rather than here.

use crate::backend::types::*;
use thiserror::Error;

/// Backend error type. Every variant is fatal at demo startup; at frame
/// time only the acquire/present pair can occur and the frame is skipped.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend initialization failed: {0}")]
    InitializationFailed(String),
    #[error("surface creation failed: {0}")]
    SurfaceCreationFailed(String),
    #[error("device creation failed: {0}")]
    DeviceCreationFailed(String),
    #[error("could not acquire the next swapchain image: {0}")]
    AcquireImageFailed(String),
    #[error("buffer creation failed: {0}")]
    BufferCreationFailed(String),
    #[error("texture creation failed: {0}")]
    TextureCreationFailed(String),
    #[error("pipeline creation failed: {0}")]
    PipelineCreationFailed(String),
    #[error("surface lost")]
    SurfaceLost,
    #[error("out of device memory")]
    OutOfMemory,
}

pub type BackendResult<T> = Result<T, BackendError>;

macro_rules! resource_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) u64);
    };
}

resource_handle!(
    /// Handle to a GPU buffer
    BufferHandle
);
resource_handle!(
    /// Handle to a GPU texture
    TextureHandle
);
resource_handle!(
    /// Handle to a texture view
    TextureViewHandle
);
resource_handle!(
    /// Handle to a sampler
    SamplerHandle
);
resource_handle!(
    /// Handle to a render pipeline
    RenderPipelineHandle
);
resource_handle!(
    /// Handle to a bind group
    BindGroupHandle
);
resource_handle!(
    /// Handle to a bind group layout
    BindGroupLayoutHandle
);

/// Resource bound at one bind-group slot
#[derive(Debug, Clone)]
pub enum BindGroupEntry {
    Buffer {
        buffer: BufferHandle,
        offset: u64,
        size: Option<u64>,
    },
    Texture(TextureViewHandle),
    Sampler(SamplerHandle),
}

/// What kind of resource a bind-group slot expects
#[derive(Debug, Clone)]
pub enum BindingType {
    UniformBuffer,
    Texture,
    Sampler,
}

/// Bind group layout entry
#[derive(Debug, Clone)]
pub struct BindGroupLayoutEntry {
    pub binding: u32,
    pub visibility: ShaderStageFlags,
    pub ty: BindingType,
}

/// Render pipeline descriptor. One WGSL module provides both entry points
/// (`vs_main` / `fs_main`).
#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor {
    pub label: Option<String>,
    pub shader: String,
    pub vertex_layouts: Vec<VertexBufferLayout>,
    pub bind_group_layouts: Vec<BindGroupLayoutHandle>,
    pub primitive_topology: PrimitiveTopology,
    pub front_face: FrontFace,
    pub cull_mode: CullMode,
    pub depth_stencil: Option<DepthStencilState>,
    pub color_targets: Vec<ColorTargetState>,
}

#[derive(Debug, Clone)]
pub struct DepthStencilState {
    pub format: TextureFormat,
    pub depth_write_enabled: bool,
    pub depth_compare: CompareFunction,
}

#[derive(Debug, Clone)]
pub struct ColorTargetState {
    pub format: TextureFormat,
    pub blend: Option<BlendState>,
}

#[derive(Debug, Clone)]
pub enum LoadOp {
    Clear([f32; 4]),
    Load,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Store,
    Discard,
}

/// Color attachment for a render pass
#[derive(Debug, Clone)]
pub struct ColorAttachment {
    pub view: TextureViewHandle,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
}

/// Depth attachment for a render pass
#[derive(Debug, Clone)]
pub struct DepthStencilAttachment {
    pub view: TextureViewHandle,
    pub depth_load_op: LoadOp,
    pub depth_store_op: StoreOp,
    pub depth_clear_value: f32,
}

/// Render pass descriptor
#[derive(Debug, Clone)]
pub struct RenderPassDescriptor {
    pub label: Option<String>,
    pub color_attachments: Vec<ColorAttachment>,
    pub depth_stencil_attachment: Option<DepthStencilAttachment>,
}

/// Index element width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

/// Handed out by [`GraphicsBackend::begin_frame`]: the swapchain view to
/// target and the surface extent.
pub struct FrameContext {
    pub swapchain_view: TextureViewHandle,
    pub width: u32,
    pub height: u32,
}

/// The operations the library issues against an initialized device.
pub trait GraphicsBackend {
    // Surface lifecycle

    /// Resize the swapchain
    fn resize(&mut self, width: u32, height: u32);

    /// Actual surface size (may be clamped by device limits)
    fn surface_size(&self) -> (u32, u32);

    /// Swapchain color format
    fn swapchain_format(&self) -> TextureFormat;

    /// Begin a new frame
    fn begin_frame(&mut self) -> BackendResult<FrameContext>;

    /// End and present the frame
    fn end_frame(&mut self) -> BackendResult<()>;

    // Resource creation and upload

    /// Create an empty buffer
    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle>;

    /// Create a buffer with initial data
    fn create_buffer_init(&mut self, desc: &BufferDescriptor, data: &[u8])
        -> BackendResult<BufferHandle>;

    /// Write data into a buffer at a byte offset
    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]);

    /// Create a texture
    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle>;

    /// Create a view over a texture
    fn create_texture_view(&mut self, texture: TextureHandle) -> BackendResult<TextureViewHandle>;

    /// Write tightly-packed RGBA8 data into a texture
    fn write_texture(&mut self, texture: TextureHandle, data: &[u8], width: u32, height: u32);

    /// Create a sampler
    fn create_sampler(&mut self, desc: &SamplerDescriptor) -> BackendResult<SamplerHandle>;

    /// Create a bind group layout
    fn create_bind_group_layout(
        &mut self,
        entries: &[BindGroupLayoutEntry],
    ) -> BackendResult<BindGroupLayoutHandle>;

    /// Create a bind group
    fn create_bind_group(
        &mut self,
        layout: BindGroupLayoutHandle,
        entries: &[(u32, BindGroupEntry)],
    ) -> BackendResult<BindGroupHandle>;

    /// Create a render pipeline
    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> BackendResult<RenderPipelineHandle>;

    // Render pass recording

    /// Begin a render pass
    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor);

    /// End the current render pass
    fn end_render_pass(&mut self);

    /// Set the render pipeline
    fn set_render_pipeline(&mut self, pipeline: RenderPipelineHandle);

    /// Set a bind group
    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupHandle);

    /// Set a vertex buffer slot
    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle, offset: u64);

    /// Set the index buffer
    fn set_index_buffer(&mut self, buffer: BufferHandle, offset: u64, format: IndexFormat);

    /// Set the viewport
    fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32, min_depth: f32, max_depth: f32);

    /// Draw primitives over a vertex and instance range
    fn draw(&mut self, vertices: std::ops::Range<u32>, instances: std::ops::Range<u32>);

    /// Draw indexed primitives over an index and instance range
    fn draw_indexed(
        &mut self,
        indices: std::ops::Range<u32>,
        base_vertex: i32,
        instances: std::ops::Range<u32>,
    );

    // Resource cleanup

    /// Destroy a buffer
    fn destroy_buffer(&mut self, buffer: BufferHandle);

    /// Destroy a texture
    fn destroy_texture(&mut self, texture: TextureHandle);
}
