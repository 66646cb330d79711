//! Per-instance record types and their GPU attribute contracts
//!
//! Field order and types are part of the shader contract: the instance
//! buffer is bound as an instance-stepped vertex stream, so every record's
//! byte layout must match the attribute declarations below exactly.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec2, Vec3};

use crate::backend::types::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

/// A record that can populate an instance-stepped vertex stream.
pub trait InstanceRecord: Pod + Zeroable {
    /// The instance attribute layout. Stride is the full record size; the
    /// attribute list may skip CPU-only fields.
    fn instance_layout() -> VertexBufferLayout;
}

/// Per-instance model transform, bound as four consecutive vec4 attributes
/// (the matrix columns) at shader locations 3-6.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TransformInstance {
    pub model: Mat4,
}

impl TransformInstance {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            model: Mat4::from_translation(translation),
        }
    }

    /// Translation, rotation about an axis (radians), uniform scale.
    pub fn from_trs(translation: Vec3, axis: Vec3, angle: f32, scale: f32) -> Self {
        Self {
            model: Mat4::from_scale_rotation_translation(
                Vec3::splat(scale),
                Quat::from_axis_angle(axis.normalize(), angle),
                translation,
            ),
        }
    }
}

impl InstanceRecord for TransformInstance {
    fn instance_layout() -> VertexBufferLayout {
        VertexBufferLayout::per_instance(
            std::mem::size_of::<Self>() as u64,
            (0..4)
                .map(|column| VertexAttribute {
                    location: 3 + column,
                    format: VertexFormat::Float32x4,
                    offset: column as u64 * 16,
                })
                .collect(),
        )
    }
}

/// Per-instance 2D sprite record: position and packed color reach the
/// shader; velocity and lifetime are CPU-side simulation state the
/// attribute stream skips (stride still covers the whole record).
///
/// The lifetime field is decremented by the simulation but never consulted
/// to remove or fade a sprite.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SpriteInstance {
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: [u8; 4],
    pub lifetime: f32,
}

impl SpriteInstance {
    pub fn new(position: Vec2, velocity: Vec2, color: [u8; 4]) -> Self {
        Self {
            position,
            velocity,
            color,
            lifetime: 0.0,
        }
    }

    pub fn with_lifetime(mut self, lifetime: f32) -> Self {
        self.lifetime = lifetime;
        self
    }
}

impl InstanceRecord for SpriteInstance {
    fn instance_layout() -> VertexBufferLayout {
        VertexBufferLayout::per_instance(
            std::mem::size_of::<Self>() as u64,
            vec![
                VertexAttribute {
                    location: 3,
                    format: VertexFormat::Float32x2,
                    offset: 0,
                },
                VertexAttribute {
                    location: 4,
                    format: VertexFormat::Unorm8x4,
                    offset: 16,
                },
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_instance_is_one_matrix() {
        assert_eq!(std::mem::size_of::<TransformInstance>(), 64);
        let layout = TransformInstance::instance_layout();
        assert_eq!(layout.array_stride, 64);
        assert_eq!(layout.step_mode, VertexStepMode::Instance);
        assert_eq!(layout.attributes.len(), 4);
        for (i, attr) in layout.attributes.iter().enumerate() {
            assert_eq!(attr.format, VertexFormat::Float32x4);
            assert_eq!(attr.offset, i as u64 * 16);
            assert_eq!(attr.location, 3 + i as u32);
        }
    }

    #[test]
    fn sprite_instance_layout_matches_record_bytes() {
        // position(8) + velocity(8) + color(4) + lifetime(4)
        assert_eq!(std::mem::size_of::<SpriteInstance>(), 24);
        let layout = SpriteInstance::instance_layout();
        assert_eq!(layout.array_stride, 24);
        assert_eq!(layout.step_mode, VertexStepMode::Instance);

        // Only position and color are shader-visible
        assert_eq!(layout.attributes.len(), 2);
        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.attributes[0].format, VertexFormat::Float32x2);
        assert_eq!(layout.attributes[1].offset, 16);
        assert_eq!(layout.attributes[1].format, VertexFormat::Unorm8x4);
    }

    #[test]
    fn sprite_color_bytes_land_at_declared_offset() {
        let sprite = SpriteInstance::new(Vec2::ZERO, Vec2::ZERO, [10, 20, 30, 255]);
        let bytes = bytemuck::bytes_of(&sprite);
        assert_eq!(&bytes[16..20], &[10, 20, 30, 255]);
    }

    #[test]
    fn trs_composes_scale_rotation_translation() {
        let instance =
            TransformInstance::from_trs(Vec3::new(1.0, 2.0, 3.0), Vec3::Y, 0.0, 2.0);
        let transformed = instance.model.transform_point3(Vec3::X);
        assert!((transformed - Vec3::new(3.0, 2.0, 3.0)).length() < 1e-5);
    }
}
