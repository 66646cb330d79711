//! wgpu backend implementation
//!
//! Render-pass commands are buffered while a pass is open and replayed in
//! one go at `end_render_pass`; this keeps the trait object-safe (no
//! lifetime-carrying pass object crosses the trait boundary) at the cost of
//! a per-pass command vector.

mod convert;

use crate::backend::traits::*;
use crate::backend::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;

use self::convert as cv;

/// Id-keyed storage for one kind of wgpu resource
struct Registry<T> {
    entries: HashMap<u64, T>,
    next_id: u64,
}

impl<T> Registry<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
        }
    }

    fn insert(&mut self, value: T) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, value);
        id
    }

    fn get(&self, id: u64) -> Option<&T> {
        self.entries.get(&id)
    }

    fn remove(&mut self, id: u64) {
        self.entries.remove(&id);
    }
}

/// Buffered render pass command
#[derive(Clone)]
enum PassCommand {
    Pipeline(RenderPipelineHandle),
    BindGroup(u32, BindGroupHandle),
    VertexBuffer(u32, BufferHandle, u64),
    IndexBuffer(BufferHandle, u64, IndexFormat),
    Viewport([f32; 6]),
    Draw(std::ops::Range<u32>, std::ops::Range<u32>),
    DrawIndexed(std::ops::Range<u32>, i32, std::ops::Range<u32>),
}

/// An open render pass: its descriptor plus the commands recorded so far
struct OpenPass {
    descriptor: RenderPassDescriptor,
    commands: Vec<PassCommand>,
}

/// wgpu implementation of [`GraphicsBackend`]
pub struct WgpuBackend {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    #[allow(dead_code)]
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,

    // Per-frame state
    current_texture: Option<wgpu::SurfaceTexture>,
    swapchain_view_id: u64,
    encoder: Option<wgpu::CommandEncoder>,
    open_pass: Option<OpenPass>,

    // Resources
    buffers: Registry<wgpu::Buffer>,
    textures: Registry<wgpu::Texture>,
    texture_views: Registry<wgpu::TextureView>,
    samplers: Registry<wgpu::Sampler>,
    bind_group_layouts: Registry<wgpu::BindGroupLayout>,
    bind_groups: Registry<wgpu::BindGroup>,
    render_pipelines: Registry<wgpu::RenderPipeline>,
}

impl WgpuBackend {
    /// Create a backend for the given window, blocking on device acquisition
    pub fn new(window: Arc<winit::window::Window>, vsync: bool) -> BackendResult<Self> {
        pollster::block_on(Self::new_async(window, vsync))
    }

    /// Async initialization - adapter and device acquisition are async in
    /// wgpu
    pub async fn new_async(window: Arc<winit::window::Window>, vsync: bool) -> BackendResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| BackendError::SurfaceCreationFailed(e.to_string()))?;

        let (adapter, device, queue) = Self::acquire_device(&instance, &surface).await?;

        let size = window.inner_size();
        let surface_config =
            Self::surface_configuration(&surface, &adapter, size.width, size.height, vsync);
        surface.configure(&device, &surface_config);

        Ok(Self {
            instance,
            surface,
            adapter,
            device,
            queue,
            surface_config,
            current_texture: None,
            swapchain_view_id: 0,
            encoder: None,
            open_pass: None,
            buffers: Registry::new(),
            textures: Registry::new(),
            texture_views: Registry::new(),
            samplers: Registry::new(),
            bind_group_layouts: Registry::new(),
            bind_groups: Registry::new(),
            render_pipelines: Registry::new(),
        })
    }

    async fn acquire_device(
        instance: &wgpu::Instance,
        surface: &wgpu::Surface<'static>,
    ) -> BackendResult<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| {
                BackendError::InitializationFailed("No suitable adapter found".into())
            })?;

        let info = adapter.get_info();
        log::info!("Selected GPU: {} ({:?} backend)", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Demo Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .map_err(|e| BackendError::DeviceCreationFailed(e.to_string()))?;

        Ok((adapter, device, queue))
    }

    fn surface_configuration(
        surface: &wgpu::Surface<'_>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> wgpu::SurfaceConfiguration {
        let caps = surface.get_capabilities(adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);

        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }

    /// Width/height clamped to the device's maximum texture dimension,
    /// preserving aspect ratio.
    fn clamp_to_limits(&self, width: u32, height: u32) -> (u32, u32) {
        let max = self.device.limits().max_texture_dimension_2d;
        if width <= max && height <= max {
            return (width, height);
        }
        let scale = (max as f32 / width as f32).min(max as f32 / height as f32);
        (
            ((width as f32 * scale) as u32).max(1),
            ((height as f32 * scale) as u32).max(1),
        )
    }

    /// Resolve an attachment view: either the lazily-created swapchain view
    /// or a registered texture view.
    fn resolve_view<'a>(
        &'a self,
        handle: TextureViewHandle,
        swapchain_view: &'a Option<wgpu::TextureView>,
    ) -> Option<&'a wgpu::TextureView> {
        if handle.0 == self.swapchain_view_id {
            swapchain_view.as_ref()
        } else {
            self.texture_views.get(handle.0)
        }
    }

    fn replay_pass(&self, pass: &OpenPass, encoder: &mut wgpu::CommandEncoder) {
        let swapchain_view = self
            .current_texture
            .as_ref()
            .map(|t| t.texture.create_view(&wgpu::TextureViewDescriptor::default()));

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = pass
            .descriptor
            .color_attachments
            .iter()
            .filter_map(|att| {
                let view = self.resolve_view(att.view, &swapchain_view)?;
                Some(Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: cv::load_op_color(&att.load_op),
                        store: cv::store_op(att.store_op),
                    },
                }))
            })
            .collect();

        let depth_attachment = pass
            .descriptor
            .depth_stencil_attachment
            .as_ref()
            .and_then(|att| {
                let view = self.texture_views.get(att.view.0)?;
                Some(wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: cv::load_op_depth(&att.depth_load_op, att.depth_clear_value),
                        store: cv::store_op(att.depth_store_op),
                    }),
                    stencil_ops: None,
                })
            });

        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: pass.descriptor.label.as_deref(),
            color_attachments: &color_attachments,
            depth_stencil_attachment: depth_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        for command in &pass.commands {
            match command {
                PassCommand::Pipeline(handle) => {
                    if let Some(pipeline) = self.render_pipelines.get(handle.0) {
                        rp.set_pipeline(pipeline);
                    }
                }
                PassCommand::BindGroup(index, handle) => {
                    if let Some(group) = self.bind_groups.get(handle.0) {
                        rp.set_bind_group(*index, group, &[]);
                    }
                }
                PassCommand::VertexBuffer(slot, handle, offset) => {
                    if let Some(buffer) = self.buffers.get(handle.0) {
                        rp.set_vertex_buffer(*slot, buffer.slice(*offset..));
                    }
                }
                PassCommand::IndexBuffer(handle, offset, format) => {
                    if let Some(buffer) = self.buffers.get(handle.0) {
                        rp.set_index_buffer(buffer.slice(*offset..), cv::index_format(*format));
                    }
                }
                PassCommand::Viewport([x, y, w, h, min_d, max_d]) => {
                    rp.set_viewport(*x, *y, *w, *h, *min_d, *max_d);
                }
                PassCommand::Draw(vertices, instances) => {
                    rp.draw(vertices.clone(), instances.clone());
                }
                PassCommand::DrawIndexed(indices, base_vertex, instances) => {
                    rp.draw_indexed(indices.clone(), *base_vertex, instances.clone());
                }
            }
        }
    }

    fn record(&mut self, command: PassCommand) {
        if let Some(pass) = self.open_pass.as_mut() {
            pass.commands.push(command);
        }
    }
}

impl GraphicsBackend for WgpuBackend {
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let (width, height) = self.clamp_to_limits(width, height);
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    fn swapchain_format(&self) -> TextureFormat {
        cv::texture_format_from_wgpu(self.surface_config.format)
    }

    fn begin_frame(&mut self) -> BackendResult<FrameContext> {
        let output = self.surface.get_current_texture().map_err(|e| match e {
            wgpu::SurfaceError::Lost => BackendError::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => BackendError::OutOfMemory,
            other => BackendError::AcquireImageFailed(other.to_string()),
        })?;

        // The swapchain view gets a fresh id each frame; the wgpu view is
        // created on demand when a pass targets it.
        self.swapchain_view_id = self.texture_views.insert_placeholder();

        self.current_texture = Some(output);
        self.encoder = Some(self.device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            },
        ));

        Ok(FrameContext {
            swapchain_view: TextureViewHandle(self.swapchain_view_id),
            width: self.surface_config.width,
            height: self.surface_config.height,
        })
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
        if let Some(texture) = self.current_texture.take() {
            texture.present();
        }
        Ok(())
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: desc.label.as_deref(),
            size: desc.size,
            usage: cv::buffer_usages(desc.usage),
            mapped_at_creation: false,
        });
        Ok(BufferHandle(self.buffers.insert(buffer)))
    }

    fn create_buffer_init(
        &mut self,
        desc: &BufferDescriptor,
        data: &[u8],
    ) -> BackendResult<BufferHandle> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: desc.label.as_deref(),
                contents: data,
                usage: cv::buffer_usages(desc.usage),
            });
        Ok(BufferHandle(self.buffers.insert(buffer)))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        if let Some(target) = self.buffers.get(buffer.0) {
            self.queue.write_buffer(target, offset, data);
        }
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: desc.label.as_deref(),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: cv::texture_format(desc.format),
            usage: cv::texture_usages(desc.usage),
            view_formats: &[],
        });
        Ok(TextureHandle(self.textures.insert(texture)))
    }

    fn create_texture_view(&mut self, texture: TextureHandle) -> BackendResult<TextureViewHandle> {
        let texture = self
            .textures
            .get(texture.0)
            .ok_or_else(|| BackendError::TextureCreationFailed("Texture not found".into()))?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(TextureViewHandle(self.texture_views.insert(view)))
    }

    fn write_texture(&mut self, texture: TextureHandle, data: &[u8], width: u32, height: u32) {
        let Some(target) = self.textures.get(texture.0) else {
            return;
        };
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn create_sampler(&mut self, desc: &SamplerDescriptor) -> BackendResult<SamplerHandle> {
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: desc.label.as_deref(),
            address_mode_u: cv::address_mode(desc.address_mode_u),
            address_mode_v: cv::address_mode(desc.address_mode_v),
            mag_filter: cv::filter_mode(desc.mag_filter),
            min_filter: cv::filter_mode(desc.min_filter),
            ..Default::default()
        });
        Ok(SamplerHandle(self.samplers.insert(sampler)))
    }

    fn create_bind_group_layout(
        &mut self,
        entries: &[BindGroupLayoutEntry],
    ) -> BackendResult<BindGroupLayoutHandle> {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = entries
            .iter()
            .map(|entry| wgpu::BindGroupLayoutEntry {
                binding: entry.binding,
                visibility: cv::shader_stages(entry.visibility),
                ty: cv::binding_type(&entry.ty),
                count: None,
            })
            .collect();

        let layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: None,
                entries: &entries,
            });
        Ok(BindGroupLayoutHandle(self.bind_group_layouts.insert(layout)))
    }

    fn create_bind_group(
        &mut self,
        layout: BindGroupLayoutHandle,
        entries: &[(u32, BindGroupEntry)],
    ) -> BackendResult<BindGroupHandle> {
        let layout = self
            .bind_group_layouts
            .get(layout.0)
            .ok_or_else(|| BackendError::PipelineCreationFailed("Layout not found".into()))?;

        let entries: Vec<wgpu::BindGroupEntry> = entries
            .iter()
            .filter_map(|(binding, entry)| {
                let resource = match entry {
                    BindGroupEntry::Buffer { buffer, offset, size } => {
                        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: self.buffers.get(buffer.0)?,
                            offset: *offset,
                            size: size.and_then(std::num::NonZeroU64::new),
                        })
                    }
                    BindGroupEntry::Texture(view) => {
                        wgpu::BindingResource::TextureView(self.texture_views.get(view.0)?)
                    }
                    BindGroupEntry::Sampler(sampler) => {
                        wgpu::BindingResource::Sampler(self.samplers.get(sampler.0)?)
                    }
                };
                Some(wgpu::BindGroupEntry {
                    binding: *binding,
                    resource,
                })
            })
            .collect();

        let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout,
            entries: &entries,
        });
        Ok(BindGroupHandle(self.bind_groups.insert(group)))
    }

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> BackendResult<RenderPipelineHandle> {
        let shader = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: desc.label.as_deref(),
                source: wgpu::ShaderSource::Wgsl(desc.shader.as_str().into()),
            });

        let layouts: Vec<&wgpu::BindGroupLayout> = desc
            .bind_group_layouts
            .iter()
            .filter_map(|handle| self.bind_group_layouts.get(handle.0))
            .collect();

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });

        // Attribute arrays must outlive the borrowing layout structs
        let attribute_arrays: Vec<Vec<wgpu::VertexAttribute>> = desc
            .vertex_layouts
            .iter()
            .map(|layout| layout.attributes.iter().map(cv::vertex_attribute).collect())
            .collect();

        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = desc
            .vertex_layouts
            .iter()
            .zip(&attribute_arrays)
            .map(|(layout, attributes)| wgpu::VertexBufferLayout {
                array_stride: layout.array_stride,
                step_mode: cv::step_mode(layout.step_mode),
                attributes,
            })
            .collect();

        let color_targets: Vec<Option<wgpu::ColorTargetState>> = desc
            .color_targets
            .iter()
            .map(|target| Some(cv::color_target(target)))
            .collect();

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: desc.label.as_deref(),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &vertex_buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &color_targets,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: cv::topology(desc.primitive_topology),
                    strip_index_format: None,
                    front_face: cv::front_face(desc.front_face),
                    cull_mode: cv::cull_mode(desc.cull_mode),
                    ..Default::default()
                },
                depth_stencil: desc.depth_stencil.as_ref().map(cv::depth_stencil),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        Ok(RenderPipelineHandle(self.render_pipelines.insert(pipeline)))
    }

    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor) {
        self.open_pass = Some(OpenPass {
            descriptor: desc.clone(),
            commands: Vec::new(),
        });
    }

    fn end_render_pass(&mut self) {
        let Some(pass) = self.open_pass.take() else {
            return;
        };
        let Some(mut encoder) = self.encoder.take() else {
            return;
        };

        self.replay_pass(&pass, &mut encoder);
        self.encoder = Some(encoder);
    }

    fn set_render_pipeline(&mut self, pipeline: RenderPipelineHandle) {
        self.record(PassCommand::Pipeline(pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupHandle) {
        self.record(PassCommand::BindGroup(index, bind_group));
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle, offset: u64) {
        self.record(PassCommand::VertexBuffer(slot, buffer, offset));
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle, offset: u64, format: IndexFormat) {
        self.record(PassCommand::IndexBuffer(buffer, offset, format));
    }

    fn set_viewport(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        min_depth: f32,
        max_depth: f32,
    ) {
        self.record(PassCommand::Viewport([x, y, width, height, min_depth, max_depth]));
    }

    fn draw(&mut self, vertices: std::ops::Range<u32>, instances: std::ops::Range<u32>) {
        self.record(PassCommand::Draw(vertices, instances));
    }

    fn draw_indexed(
        &mut self,
        indices: std::ops::Range<u32>,
        base_vertex: i32,
        instances: std::ops::Range<u32>,
    ) {
        self.record(PassCommand::DrawIndexed(indices, base_vertex, instances));
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(buffer.0);
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(texture.0);
    }
}

impl Registry<wgpu::TextureView> {
    /// Reserve an id with no stored view (the swapchain view is created
    /// lazily from the surface texture each frame).
    fn insert_placeholder(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

// Overlay rendering support: egui-wgpu needs raw device/queue/encoder
// access and a render pass that loads (not clears) the scene.
impl WgpuBackend {
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Surface format as the raw wgpu type (egui renderer creation)
    pub fn wgpu_surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Device, queue, and encoder in one borrow (egui buffer updates)
    pub fn device_queue_encoder(
        &mut self,
    ) -> (&wgpu::Device, &wgpu::Queue, Option<&mut wgpu::CommandEncoder>) {
        (&self.device, &self.queue, self.encoder.as_mut())
    }

    /// Handle to the current swapchain view; None outside a frame
    pub fn current_swapchain_view(&self) -> Option<TextureViewHandle> {
        self.current_texture
            .as_ref()
            .map(|_| TextureViewHandle(self.swapchain_view_id))
    }

    /// Draw egui paint jobs over the frame rendered so far
    pub fn render_egui(
        &mut self,
        renderer: &egui_wgpu::Renderer,
        paint_jobs: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        target: TextureViewHandle,
    ) {
        let Some(encoder) = self.encoder.as_mut() else {
            return;
        };

        let swapchain_view = self
            .current_texture
            .as_ref()
            .map(|t| t.texture.create_view(&wgpu::TextureViewDescriptor::default()));

        let view = if target.0 == self.swapchain_view_id {
            match swapchain_view.as_ref() {
                Some(view) => view,
                None => return,
            }
        } else {
            match self.texture_views.get(target.0) {
                Some(view) => view,
                None => return,
            }
        };

        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        renderer.render(&mut rp, paint_jobs, screen_descriptor);
    }
}
