//! Descriptor and vertex types shared between the backend trait and its
//! implementations

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

macro_rules! bit_flags {
    ($(#[$meta:meta])* $name:ident { $($flag:ident = $bit:expr;)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(u32);

        impl $name {
            $(pub const $flag: Self = Self(1 << $bit);)*

            pub fn contains(&self, other: Self) -> bool {
                (self.0 & other.0) == other.0
            }

            pub fn bits(&self) -> u32 {
                self.0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self::Output {
                Self(self.0 | rhs.0)
            }
        }
    };
}

bit_flags! {
    /// Buffer usage flags
    BufferUsage {
        COPY_SRC = 0;
        COPY_DST = 1;
        INDEX = 2;
        VERTEX = 3;
        UNIFORM = 4;
    }
}

bit_flags! {
    /// Texture usage flags
    TextureUsage {
        COPY_DST = 0;
        TEXTURE_BINDING = 1;
        RENDER_ATTACHMENT = 2;
    }
}

bit_flags! {
    /// Shader stages a binding is visible to
    ShaderStageFlags {
        VERTEX = 0;
        FRAGMENT = 1;
    }
}

impl ShaderStageFlags {
    pub const VERTEX_FRAGMENT: Self = Self((1 << 0) | (1 << 1));
}

/// Texture formats the demos touch: an sRGB/linear RGBA8 pair for content,
/// the BGRA swapchain variants, and the depth buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Depth32Float,
}

impl TextureFormat {
    pub fn is_depth(&self) -> bool {
        matches!(self, TextureFormat::Depth32Float)
    }
}

/// Texture descriptor (2D, single mip - all the demos need)
#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

/// Buffer descriptor
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    pub label: Option<String>,
    pub size: u64,
    pub usage: BufferUsage,
}

/// Vertex attribute component format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
    /// Four unsigned bytes normalized to [0, 1] in the shader; used for
    /// packed RGBA colors.
    Unorm8x4,
}

impl VertexFormat {
    pub fn size(&self) -> u64 {
        match self {
            VertexFormat::Float32 | VertexFormat::Unorm8x4 => 4,
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

/// One attribute within a vertex buffer layout
#[derive(Debug, Clone)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: VertexFormat,
    pub offset: u64,
}

/// How a vertex buffer advances: once per vertex, or once per instance
/// (the divisor-1 attribute stream that makes instancing work).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexStepMode {
    Vertex,
    Instance,
}

/// Typed description of a vertex buffer: stride, step mode, and attribute
/// list. Built by the vertex/record types themselves so byte offsets never
/// appear at binding sites.
#[derive(Debug, Clone)]
pub struct VertexBufferLayout {
    pub array_stride: u64,
    pub step_mode: VertexStepMode,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexBufferLayout {
    pub fn per_vertex(stride: u64, attributes: Vec<VertexAttribute>) -> Self {
        Self {
            array_stride: stride,
            step_mode: VertexStepMode::Vertex,
            attributes,
        }
    }

    pub fn per_instance(stride: u64, attributes: Vec<VertexAttribute>) -> Self {
        Self {
            array_stride: stride,
            step_mode: VertexStepMode::Instance,
            attributes,
        }
    }
}

/// Mesh vertex with position, normal, and UV
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn layout() -> VertexBufferLayout {
        VertexBufferLayout::per_vertex(
            std::mem::size_of::<Self>() as u64,
            vec![
                VertexAttribute { location: 0, format: VertexFormat::Float32x3, offset: 0 },
                VertexAttribute { location: 1, format: VertexFormat::Float32x3, offset: 12 },
                VertexAttribute { location: 2, format: VertexFormat::Float32x2, offset: 24 },
            ],
        )
    }
}

/// 2D sprite vertex with position (pixels), UV, and packed RGBA color.
/// Serves both the instanced quad mesh (color left white, tinted per
/// instance) and the immediate-mode batch (color carried per vertex).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: Vec2,
    pub uv: Vec2,
    pub color: [u8; 4],
}

impl SpriteVertex {
    pub fn layout() -> VertexBufferLayout {
        VertexBufferLayout::per_vertex(
            std::mem::size_of::<Self>() as u64,
            vec![
                VertexAttribute { location: 0, format: VertexFormat::Float32x2, offset: 0 },
                VertexAttribute { location: 1, format: VertexFormat::Float32x2, offset: 8 },
                VertexAttribute { location: 2, format: VertexFormat::Unorm8x4, offset: 16 },
            ],
        )
    }
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    LineList,
    TriangleList,
}

/// Front face winding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    Ccw,
    Cw,
}

/// Cull mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Back,
}

/// Depth test functions the demos use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunction {
    Less,
    LessEqual,
    Always,
}

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Blend component state
#[derive(Debug, Clone, Copy)]
pub struct BlendComponent {
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
}

/// Blend state (additive blend operation throughout)
#[derive(Debug, Clone, Copy)]
pub struct BlendState {
    pub color: BlendComponent,
    pub alpha: BlendComponent,
}

impl BlendState {
    /// Standard premultiplied-style alpha blending for sprites
    pub fn alpha_blending() -> Self {
        Self {
            color: BlendComponent {
                src_factor: BlendFactor::SrcAlpha,
                dst_factor: BlendFactor::OneMinusSrcAlpha,
            },
            alpha: BlendComponent {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::OneMinusSrcAlpha,
            },
        }
    }
}

/// Filter mode for samplers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Address mode for samplers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    ClampToEdge,
    Repeat,
}

/// Sampler descriptor
#[derive(Debug, Clone)]
pub struct SamplerDescriptor {
    pub label: Option<String>,
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        let layout = Vertex::layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.step_mode, VertexStepMode::Vertex);
        let total: u64 = layout.attributes.iter().map(|a| a.format.size()).sum();
        assert_eq!(total, layout.array_stride);
    }

    #[test]
    fn sprite_vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<SpriteVertex>(), 20);
        let layout = SpriteVertex::layout();
        assert_eq!(layout.array_stride, 20);
        assert_eq!(layout.attributes[2].format, VertexFormat::Unorm8x4);
        assert_eq!(layout.attributes[2].offset, 16);
    }

    #[test]
    fn usage_flags_combine_and_contain() {
        let usage = BufferUsage::VERTEX | BufferUsage::COPY_DST;
        assert!(usage.contains(BufferUsage::VERTEX));
        assert!(usage.contains(BufferUsage::COPY_DST));
        assert!(!usage.contains(BufferUsage::INDEX));
    }
}
