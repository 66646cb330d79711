//! Procedural meshes and textures

mod mesh;
mod texture;

pub use mesh::*;
pub use texture::*;
