//! Camera state: position/target pair plus a projection

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Projection half of the camera
#[derive(Debug, Clone, Copy)]
pub enum Projection {
    Perspective {
        /// Vertical field of view in degrees
        fovy: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    pub fn perspective(fovy_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Projection::Perspective {
            fovy: fovy_degrees,
            aspect,
            near,
            far,
        }
    }

    /// Pixel-space projection with the origin at the top-left corner,
    /// matching 2D sprite coordinates.
    pub fn pixel_space(width: f32, height: f32) -> Self {
        Projection::Orthographic {
            left: 0.0,
            right: width,
            bottom: height,
            top: 0.0,
            near: -1.0,
            far: 1.0,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective { fovy, aspect, near, far } => {
                Mat4::perspective_rh(fovy.to_radians(), aspect, near, far)
            }
            Projection::Orthographic { left, right, bottom, top, near, far } => {
                Mat4::orthographic_rh(left, right, bottom, top, near, far)
            }
        }
    }

    /// Vertical field of view in degrees; None for orthographic projections
    pub fn fovy_degrees(&self) -> Option<f32> {
        match self {
            Projection::Perspective { fovy, .. } => Some(*fovy),
            Projection::Orthographic { .. } => None,
        }
    }

    pub fn set_fovy_degrees(&mut self, degrees: f32) {
        if let Projection::Perspective { fovy, .. } = self {
            *fovy = degrees;
        }
    }
}

/// Camera for viewing the scene. The free-look controller drives
/// `position`/`target`; 2D demos leave the view as identity and map pixels
/// through the orthographic projection.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Projection,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            projection: Projection::perspective(45.0, 16.0 / 9.0, 0.1, 1000.0),
        }
    }

    /// 2D camera over a pixel-space viewport; the view transform is
    /// identity, so sprite coordinates pass straight to the projection.
    pub fn pixel_space(width: f32, height: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            target: -Vec3::Z,
            up: Vec3::Y,
            projection: Projection::pixel_space(width, height),
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection.matrix() * self.view_matrix()
    }

    /// Keep a perspective projection matched to the surface after a resize
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if let Projection::Perspective { aspect, .. } = &mut self.projection {
            *aspect = width / height;
        }
    }

    /// Uniform block for the shaders
    pub fn uniform_data(&self) -> CameraUniformData {
        CameraUniformData {
            view_proj: self.view_projection_matrix(),
            position: self.position.extend(1.0),
        }
    }
}

/// Camera uniform block layout shared by every pipeline
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniformData {
    pub view_proj: Mat4,
    pub position: Vec4,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_space_view_is_identity() {
        let camera = Camera::pixel_space(800.0, 450.0);
        let view = camera.view_matrix().to_cols_array();
        for (actual, expected) in view.iter().zip(Mat4::IDENTITY.to_cols_array()) {
            assert!((actual - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn pixel_space_maps_top_left_to_clip_corner() {
        let camera = Camera::pixel_space(800.0, 450.0);
        let vp = camera.view_projection_matrix();

        let top_left = vp.project_point3(Vec3::new(0.0, 0.0, 0.0));
        assert!((top_left.x - -1.0).abs() < 1e-5);
        assert!((top_left.y - 1.0).abs() < 1e-5);

        let bottom_right = vp.project_point3(Vec3::new(800.0, 450.0, 0.0));
        assert!((bottom_right.x - 1.0).abs() < 1e-5);
        assert!((bottom_right.y - -1.0).abs() < 1e-5);
    }

    #[test]
    fn fovy_roundtrips_on_perspective_only() {
        let mut projection = Projection::perspective(45.0, 1.6, 0.1, 100.0);
        assert_eq!(projection.fovy_degrees(), Some(45.0));
        projection.set_fovy_degrees(30.0);
        assert_eq!(projection.fovy_degrees(), Some(30.0));

        let mut ortho = Projection::pixel_space(10.0, 10.0);
        assert_eq!(ortho.fovy_degrees(), None);
        ortho.set_fovy_degrees(30.0);
        assert_eq!(ortho.fovy_degrees(), None);
    }
}
