//! Mesh data structures and generation

use crate::backend::types::{SpriteVertex, Vertex};
use glam::{Vec2, Vec3};
use rand::Rng;

/// A mesh with vertex and index data
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub name: String,
}

impl Mesh {
    pub fn new(name: &str) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            name: name.to_string(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get vertex data as bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Get index data as bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Create a unit cube centered at origin
    pub fn cube() -> Self {
        let mut mesh = Mesh::new("cube");

        let faces = [
            // Front face
            (Vec3::Z, [
                Vec3::new(-0.5, -0.5, 0.5),
                Vec3::new(0.5, -0.5, 0.5),
                Vec3::new(0.5, 0.5, 0.5),
                Vec3::new(-0.5, 0.5, 0.5),
            ]),
            // Back face
            (-Vec3::Z, [
                Vec3::new(0.5, -0.5, -0.5),
                Vec3::new(-0.5, -0.5, -0.5),
                Vec3::new(-0.5, 0.5, -0.5),
                Vec3::new(0.5, 0.5, -0.5),
            ]),
            // Right face
            (Vec3::X, [
                Vec3::new(0.5, -0.5, 0.5),
                Vec3::new(0.5, -0.5, -0.5),
                Vec3::new(0.5, 0.5, -0.5),
                Vec3::new(0.5, 0.5, 0.5),
            ]),
            // Left face
            (-Vec3::X, [
                Vec3::new(-0.5, -0.5, -0.5),
                Vec3::new(-0.5, -0.5, 0.5),
                Vec3::new(-0.5, 0.5, 0.5),
                Vec3::new(-0.5, 0.5, -0.5),
            ]),
            // Top face
            (Vec3::Y, [
                Vec3::new(-0.5, 0.5, 0.5),
                Vec3::new(0.5, 0.5, 0.5),
                Vec3::new(0.5, 0.5, -0.5),
                Vec3::new(-0.5, 0.5, -0.5),
            ]),
            // Bottom face
            (-Vec3::Y, [
                Vec3::new(-0.5, -0.5, -0.5),
                Vec3::new(0.5, -0.5, -0.5),
                Vec3::new(0.5, -0.5, 0.5),
                Vec3::new(-0.5, -0.5, 0.5),
            ]),
        ];

        let uvs = [
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
        ];

        for (normal, corners) in faces {
            let base = mesh.vertices.len() as u32;
            for (corner, uv) in corners.into_iter().zip(uvs) {
                mesh.vertices.push(Vertex {
                    position: corner,
                    normal,
                    uv,
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }

    /// Create a UV sphere of the given radius
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut mesh = Mesh::new("sphere");

        let segment_angle = 2.0 * std::f32::consts::PI / segments as f32;
        let ring_angle = std::f32::consts::PI / rings as f32;

        for ring in 0..=rings {
            let phi = ring as f32 * ring_angle;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for segment in 0..=segments {
                let theta = segment as f32 * segment_angle;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                let normal = Vec3::new(x, y, z).normalize_or_zero();
                mesh.vertices.push(Vertex {
                    position: Vec3::new(x, y, z) * radius,
                    normal: if normal == Vec3::ZERO { Vec3::Y } else { normal },
                    uv: Vec2::new(
                        segment as f32 / segments as f32,
                        ring as f32 / rings as f32,
                    ),
                });
            }
        }

        for ring in 0..rings {
            for segment in 0..segments {
                let current = ring * (segments + 1) + segment;
                let next = current + segments + 1;

                mesh.indices.extend_from_slice(&[
                    current,
                    next,
                    current + 1,
                    current + 1,
                    next,
                    next + 1,
                ]);
            }
        }

        mesh
    }

    /// Create a plane on the XZ axis
    pub fn plane(width: f32, depth: f32, subdivisions: u32) -> Self {
        let mut mesh = Mesh::new("plane");

        let half_width = width / 2.0;
        let half_depth = depth / 2.0;
        let step_x = width / subdivisions as f32;
        let step_z = depth / subdivisions as f32;

        for z in 0..=subdivisions {
            for x in 0..=subdivisions {
                let px = -half_width + x as f32 * step_x;
                let pz = -half_depth + z as f32 * step_z;

                mesh.vertices.push(Vertex {
                    position: Vec3::new(px, 0.0, pz),
                    normal: Vec3::Y,
                    uv: Vec2::new(
                        x as f32 / subdivisions as f32,
                        z as f32 / subdivisions as f32,
                    ),
                });
            }
        }

        for z in 0..subdivisions {
            for x in 0..subdivisions {
                let current = z * (subdivisions + 1) + x;
                let next = current + subdivisions + 1;

                mesh.indices.extend_from_slice(&[
                    current,
                    next,
                    current + 1,
                    current + 1,
                    next,
                    next + 1,
                ]);
            }
        }

        mesh
    }

    /// Create an irregular rock: a sphere with per-vertex radial jitter.
    /// `roughness` is the jitter amplitude as a fraction of the radius.
    pub fn rock(radius: f32, segments: u32, rings: u32, roughness: f32, rng: &mut impl Rng) -> Self {
        let mut mesh = Mesh::sphere(radius, segments, rings);
        mesh.name = "rock".to_string();

        // Seam and pole vertices must displace identically, so jitter is
        // keyed on position rather than vertex index.
        for vertex in &mut mesh.vertices {
            let key = vertex.position * 17.31;
            let hash = (key.x.sin() * 43758.5453 + key.y.sin() * 28001.829 + key.z.sin() * 9103.557)
                .fract()
                .abs();
            let jitter = 1.0 + (hash * 2.0 - 1.0) * roughness * rng.gen_range(0.8..1.2);
            vertex.position *= jitter;
        }

        mesh
    }
}

/// Unit sprite quad: four [`SpriteVertex`] covering `size` pixels from the
/// top-left origin, white, with full UV range. Instanced sprite drawing
/// offsets and tints this quad per instance.
pub fn sprite_quad(size: Vec2) -> (Vec<SpriteVertex>, Vec<u32>) {
    let white = [255u8; 4];
    let vertices = vec![
        SpriteVertex { position: Vec2::new(0.0, 0.0), uv: Vec2::new(0.0, 0.0), color: white },
        SpriteVertex { position: Vec2::new(0.0, size.y), uv: Vec2::new(0.0, 1.0), color: white },
        SpriteVertex { position: Vec2::new(size.x, size.y), uv: Vec2::new(1.0, 1.0), color: white },
        SpriteVertex { position: Vec2::new(size.x, 0.0), uv: Vec2::new(1.0, 0.0), color: white },
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn cube_has_six_faces() {
        let cube = Mesh::cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
    }

    #[test]
    fn sphere_indices_stay_in_range() {
        let sphere = Mesh::sphere(0.5, 16, 8);
        let max = *sphere.indices.iter().max().unwrap() as usize;
        assert!(max < sphere.vertex_count());
    }

    #[test]
    fn rock_jitter_stays_near_radius() {
        let mut rng = StdRng::seed_from_u64(7);
        let rock = Mesh::rock(1.0, 12, 6, 0.3, &mut rng);
        for vertex in &rock.vertices {
            let r = vertex.position.length();
            assert!(r > 0.5 && r < 1.5, "vertex left the rock shell: {r}");
        }
    }

    #[test]
    fn sprite_quad_covers_size() {
        let (vertices, indices) = sprite_quad(Vec2::new(32.0, 26.0));
        assert_eq!(vertices.len(), 4);
        assert_eq!(indices.len(), 6);
        assert_eq!(vertices[2].position, Vec2::new(32.0, 26.0));
    }
}
