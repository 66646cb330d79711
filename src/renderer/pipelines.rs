//! Render pipelines and embedded WGSL shaders for the demo draw paths

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::instance::{InstanceRecord, SpriteInstance, TransformInstance};
use crate::resources::GpuTexture;
use crate::scene::CameraUniformData;

// Lit mesh shader; the model matrix arrives as four instance attributes.
const MESH_SHADER: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
}

struct MaterialUniform {
    base_color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(1) @binding(0) var<uniform> material: MaterialUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let model = mat4x4<f32>(in.model_0, in.model_1, in.model_2, in.model_3);

    var out: VertexOutput;
    let world_pos = model * vec4<f32>(in.position, 1.0);
    out.clip_position = camera.view_proj * world_pos;
    // Instance transforms here are uniform-scale, so the model matrix
    // rotates normals correctly.
    out.world_normal = normalize((model * vec4<f32>(in.normal, 0.0)).xyz);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(vec3<f32>(1.0, 1.0, 1.0));
    let ambient = 0.25;

    let ndotl = max(dot(normalize(in.world_normal), light_dir), 0.0);
    let shade = ambient + (1.0 - ambient) * ndotl;

    return vec4<f32>(material.base_color.rgb * shade, material.base_color.a);
}
"#;

// Textured quad, offset and tinted per instance.
const SPRITE_INSTANCED_SHADER: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
}

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(1) @binding(0) var sprite_texture: texture_2d<f32>;
@group(1) @binding(1) var sprite_sampler: sampler;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) color: vec4<f32>,
    @location(3) sprite_position: vec2<f32>,
    @location(4) sprite_color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = in.position + in.sprite_position;
    out.clip_position = camera.view_proj * vec4<f32>(world, 0.0, 1.0);
    out.uv = in.uv;
    out.color = in.color * in.sprite_color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(sprite_texture, sprite_sampler, in.uv) * in.color;
}
"#;

// Pre-positioned, per-vertex-colored quads from the immediate-mode batch.
const SPRITE_BATCH_SHADER: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
}

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(1) @binding(0) var sprite_texture: texture_2d<f32>;
@group(1) @binding(1) var sprite_sampler: sampler;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_proj * vec4<f32>(in.position, 0.0, 1.0);
    out.uv = in.uv;
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(sprite_texture, sprite_sampler, in.uv) * in.color;
}
"#;

/// Material uniform for the mesh pipeline
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct MaterialUniform {
    base_color: Vec4,
}

fn create_camera_resources<B: GraphicsBackend>(
    backend: &mut B,
) -> BackendResult<(BindGroupLayoutHandle, BufferHandle, BindGroupHandle)> {
    let layout = backend.create_bind_group_layout(&[BindGroupLayoutEntry {
        binding: 0,
        visibility: ShaderStageFlags::VERTEX_FRAGMENT,
        ty: BindingType::UniformBuffer,
    }])?;

    let buffer = backend.create_buffer(&BufferDescriptor {
        label: Some("Camera Buffer".into()),
        size: std::mem::size_of::<CameraUniformData>() as u64,
        usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
    })?;

    let bind_group = backend.create_bind_group(
        layout,
        &[(
            0,
            BindGroupEntry::Buffer {
                buffer,
                offset: 0,
                size: None,
            },
        )],
    )?;

    Ok((layout, buffer, bind_group))
}

fn create_texture_layout<B: GraphicsBackend>(
    backend: &mut B,
) -> BackendResult<BindGroupLayoutHandle> {
    backend.create_bind_group_layout(&[
        BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStageFlags::FRAGMENT,
            ty: BindingType::Texture,
        },
        BindGroupLayoutEntry {
            binding: 1,
            visibility: ShaderStageFlags::FRAGMENT,
            ty: BindingType::Sampler,
        },
    ])
}

/// Lit mesh pipeline with per-instance model matrices
pub struct MeshPipeline {
    pub pipeline: RenderPipelineHandle,
    camera_buffer: BufferHandle,
    camera_bind_group: BindGroupHandle,
    material_buffer: BufferHandle,
    material_bind_group: BindGroupHandle,
}

impl MeshPipeline {
    pub fn create<B: GraphicsBackend>(
        backend: &mut B,
        color_format: TextureFormat,
    ) -> BackendResult<Self> {
        let (camera_layout, camera_buffer, camera_bind_group) =
            create_camera_resources(backend)?;

        let material_layout = backend.create_bind_group_layout(&[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStageFlags::FRAGMENT,
            ty: BindingType::UniformBuffer,
        }])?;

        let material_buffer = backend.create_buffer(&BufferDescriptor {
            label: Some("Material Buffer".into()),
            size: std::mem::size_of::<MaterialUniform>() as u64,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        })?;

        let material_bind_group = backend.create_bind_group(
            material_layout,
            &[(
                0,
                BindGroupEntry::Buffer {
                    buffer: material_buffer,
                    offset: 0,
                    size: None,
                },
            )],
        )?;

        let pipeline = backend.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Mesh Pipeline".into()),
            shader: MESH_SHADER.into(),
            vertex_layouts: vec![Vertex::layout(), TransformInstance::instance_layout()],
            bind_group_layouts: vec![camera_layout, material_layout],
            primitive_topology: PrimitiveTopology::TriangleList,
            front_face: FrontFace::Ccw,
            cull_mode: CullMode::Back,
            depth_stencil: Some(DepthStencilState {
                format: TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
            }),
            color_targets: vec![ColorTargetState {
                format: color_format,
                blend: None,
            }],
        })?;

        Ok(Self {
            pipeline,
            camera_buffer,
            camera_bind_group,
            material_buffer,
            material_bind_group,
        })
    }

    pub fn update_camera<B: GraphicsBackend>(&self, backend: &mut B, data: &CameraUniformData) {
        backend.write_buffer(self.camera_buffer, 0, bytemuck::bytes_of(data));
    }

    pub fn set_base_color<B: GraphicsBackend>(&self, backend: &mut B, color: Vec4) {
        let uniform = MaterialUniform { base_color: color };
        backend.write_buffer(self.material_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Bind pipeline, camera, and material for the current pass
    pub fn bind<B: GraphicsBackend>(&self, backend: &mut B) {
        backend.set_render_pipeline(self.pipeline);
        backend.set_bind_group(0, self.camera_bind_group);
        backend.set_bind_group(1, self.material_bind_group);
    }
}

/// Textured sprite pipelines: one for the instanced path, one for the
/// batched individual path. They share the camera buffer and texture
/// bindings.
pub struct SpritePipelines {
    pub instanced: RenderPipelineHandle,
    pub batched: RenderPipelineHandle,
    camera_buffer: BufferHandle,
    camera_bind_group: BindGroupHandle,
    texture_layout: BindGroupLayoutHandle,
    sampler: SamplerHandle,
}

impl SpritePipelines {
    pub fn create<B: GraphicsBackend>(
        backend: &mut B,
        color_format: TextureFormat,
    ) -> BackendResult<Self> {
        let (camera_layout, camera_buffer, camera_bind_group) =
            create_camera_resources(backend)?;
        let texture_layout = create_texture_layout(backend)?;
        let sampler = backend.create_sampler(&SamplerDescriptor {
            label: Some("Sprite Sampler".into()),
            ..Default::default()
        })?;

        let color_targets = vec![ColorTargetState {
            format: color_format,
            blend: Some(BlendState::alpha_blending()),
        }];

        let instanced = backend.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Sprite Instanced Pipeline".into()),
            shader: SPRITE_INSTANCED_SHADER.into(),
            vertex_layouts: vec![SpriteVertex::layout(), SpriteInstance::instance_layout()],
            bind_group_layouts: vec![camera_layout, texture_layout],
            primitive_topology: PrimitiveTopology::TriangleList,
            front_face: FrontFace::Ccw,
            cull_mode: CullMode::None,
            depth_stencil: None,
            color_targets: color_targets.clone(),
        })?;

        let batched = backend.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Sprite Batch Pipeline".into()),
            shader: SPRITE_BATCH_SHADER.into(),
            vertex_layouts: vec![SpriteVertex::layout()],
            bind_group_layouts: vec![camera_layout, texture_layout],
            primitive_topology: PrimitiveTopology::TriangleList,
            front_face: FrontFace::Ccw,
            cull_mode: CullMode::None,
            depth_stencil: None,
            color_targets,
        })?;

        Ok(Self {
            instanced,
            batched,
            camera_buffer,
            camera_bind_group,
            texture_layout,
            sampler,
        })
    }

    pub fn update_camera<B: GraphicsBackend>(&self, backend: &mut B, data: &CameraUniformData) {
        backend.write_buffer(self.camera_buffer, 0, bytemuck::bytes_of(data));
    }

    /// Create the texture bind group for a loaded sprite texture
    pub fn bind_texture<B: GraphicsBackend>(
        &self,
        backend: &mut B,
        texture: &GpuTexture,
    ) -> BackendResult<BindGroupHandle> {
        backend.create_bind_group(
            self.texture_layout,
            &[
                (0, BindGroupEntry::Texture(texture.view)),
                (1, BindGroupEntry::Sampler(self.sampler)),
            ],
        )
    }

    /// Bind the instanced pipeline with camera and texture
    pub fn bind_instanced<B: GraphicsBackend>(
        &self,
        backend: &mut B,
        texture_bind_group: BindGroupHandle,
    ) {
        backend.set_render_pipeline(self.instanced);
        backend.set_bind_group(0, self.camera_bind_group);
        backend.set_bind_group(1, texture_bind_group);
    }

    /// Bind the batch pipeline with camera and texture
    pub fn bind_batched<B: GraphicsBackend>(
        &self,
        backend: &mut B,
        texture_bind_group: BindGroupHandle,
    ) {
        backend.set_render_pipeline(self.batched);
        backend.set_bind_group(0, self.camera_bind_group);
        backend.set_bind_group(1, texture_bind_group);
    }
}
