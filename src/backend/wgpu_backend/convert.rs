//! Mappings from the backend's typed descriptors to wgpu's

use crate::backend::traits::*;
use crate::backend::types::*;

pub(super) fn texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        TextureFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
        TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
    }
}

// Surface formats outside the typed enum collapse to plain RGBA8; the only
// consumer is swapchain_format and sRGB surfaces are picked at configure
// time.
pub(super) fn texture_format_from_wgpu(format: wgpu::TextureFormat) -> TextureFormat {
    match format {
        wgpu::TextureFormat::Rgba8Unorm => TextureFormat::Rgba8Unorm,
        wgpu::TextureFormat::Rgba8UnormSrgb => TextureFormat::Rgba8UnormSrgb,
        wgpu::TextureFormat::Bgra8Unorm => TextureFormat::Bgra8Unorm,
        wgpu::TextureFormat::Bgra8UnormSrgb => TextureFormat::Bgra8UnormSrgb,
        wgpu::TextureFormat::Depth32Float => TextureFormat::Depth32Float,
        _ => TextureFormat::Rgba8Unorm,
    }
}

pub(super) fn buffer_usages(usage: BufferUsage) -> wgpu::BufferUsages {
    let pairs = [
        (BufferUsage::COPY_SRC, wgpu::BufferUsages::COPY_SRC),
        (BufferUsage::COPY_DST, wgpu::BufferUsages::COPY_DST),
        (BufferUsage::INDEX, wgpu::BufferUsages::INDEX),
        (BufferUsage::VERTEX, wgpu::BufferUsages::VERTEX),
        (BufferUsage::UNIFORM, wgpu::BufferUsages::UNIFORM),
    ];
    pairs
        .into_iter()
        .filter(|(flag, _)| usage.contains(*flag))
        .fold(wgpu::BufferUsages::empty(), |acc, (_, wgpu_flag)| acc | wgpu_flag)
}

pub(super) fn texture_usages(usage: TextureUsage) -> wgpu::TextureUsages {
    let pairs = [
        (TextureUsage::COPY_DST, wgpu::TextureUsages::COPY_DST),
        (TextureUsage::TEXTURE_BINDING, wgpu::TextureUsages::TEXTURE_BINDING),
        (TextureUsage::RENDER_ATTACHMENT, wgpu::TextureUsages::RENDER_ATTACHMENT),
    ];
    pairs
        .into_iter()
        .filter(|(flag, _)| usage.contains(*flag))
        .fold(wgpu::TextureUsages::empty(), |acc, (_, wgpu_flag)| acc | wgpu_flag)
}

pub(super) fn shader_stages(visibility: ShaderStageFlags) -> wgpu::ShaderStages {
    let mut stages = wgpu::ShaderStages::empty();
    if visibility.contains(ShaderStageFlags::VERTEX) {
        stages |= wgpu::ShaderStages::VERTEX;
    }
    if visibility.contains(ShaderStageFlags::FRAGMENT) {
        stages |= wgpu::ShaderStages::FRAGMENT;
    }
    stages
}

pub(super) fn binding_type(ty: &BindingType) -> wgpu::BindingType {
    match ty {
        BindingType::UniformBuffer => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        BindingType::Texture => wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        BindingType::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
    }
}

pub(super) fn vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32 => wgpu::VertexFormat::Float32,
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
        VertexFormat::Unorm8x4 => wgpu::VertexFormat::Unorm8x4,
    }
}

pub(super) fn vertex_attribute(attribute: &VertexAttribute) -> wgpu::VertexAttribute {
    wgpu::VertexAttribute {
        format: vertex_format(attribute.format),
        offset: attribute.offset,
        shader_location: attribute.location,
    }
}

pub(super) fn step_mode(mode: VertexStepMode) -> wgpu::VertexStepMode {
    match mode {
        VertexStepMode::Vertex => wgpu::VertexStepMode::Vertex,
        VertexStepMode::Instance => wgpu::VertexStepMode::Instance,
    }
}

pub(super) fn topology(topology: PrimitiveTopology) -> wgpu::PrimitiveTopology {
    match topology {
        PrimitiveTopology::LineList => wgpu::PrimitiveTopology::LineList,
        PrimitiveTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
    }
}

pub(super) fn front_face(face: FrontFace) -> wgpu::FrontFace {
    match face {
        FrontFace::Ccw => wgpu::FrontFace::Ccw,
        FrontFace::Cw => wgpu::FrontFace::Cw,
    }
}

pub(super) fn cull_mode(mode: CullMode) -> Option<wgpu::Face> {
    match mode {
        CullMode::None => None,
        CullMode::Back => Some(wgpu::Face::Back),
    }
}

pub(super) fn compare_function(func: CompareFunction) -> wgpu::CompareFunction {
    match func {
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

pub(super) fn blend_factor(factor: BlendFactor) -> wgpu::BlendFactor {
    match factor {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
    }
}

fn blend_component(component: BlendComponent) -> wgpu::BlendComponent {
    wgpu::BlendComponent {
        src_factor: blend_factor(component.src_factor),
        dst_factor: blend_factor(component.dst_factor),
        operation: wgpu::BlendOperation::Add,
    }
}

pub(super) fn color_target(target: &ColorTargetState) -> wgpu::ColorTargetState {
    wgpu::ColorTargetState {
        format: texture_format(target.format),
        blend: target.blend.map(|blend| wgpu::BlendState {
            color: blend_component(blend.color),
            alpha: blend_component(blend.alpha),
        }),
        write_mask: wgpu::ColorWrites::ALL,
    }
}

pub(super) fn depth_stencil(state: &DepthStencilState) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: texture_format(state.format),
        depth_write_enabled: state.depth_write_enabled,
        depth_compare: compare_function(state.depth_compare),
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub(super) fn load_op_color(op: &LoadOp) -> wgpu::LoadOp<wgpu::Color> {
    match op {
        LoadOp::Clear([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
            r: *r as f64,
            g: *g as f64,
            b: *b as f64,
            a: *a as f64,
        }),
        LoadOp::Load => wgpu::LoadOp::Load,
    }
}

pub(super) fn load_op_depth(op: &LoadOp, clear_value: f32) -> wgpu::LoadOp<f32> {
    match op {
        LoadOp::Clear(_) => wgpu::LoadOp::Clear(clear_value),
        LoadOp::Load => wgpu::LoadOp::Load,
    }
}

pub(super) fn store_op(op: StoreOp) -> wgpu::StoreOp {
    match op {
        StoreOp::Store => wgpu::StoreOp::Store,
        StoreOp::Discard => wgpu::StoreOp::Discard,
    }
}

pub(super) fn index_format(format: IndexFormat) -> wgpu::IndexFormat {
    match format {
        IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
        IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
    }
}

pub(super) fn filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

pub(super) fn address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
    }
}
