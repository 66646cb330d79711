//! Graphics device abstraction
//!
//! The demos issue all GPU work through the [`GraphicsBackend`] trait;
//! [`wgpu_backend::WgpuBackend`] is the shipped implementation.

pub mod traits;
pub mod types;
pub mod wgpu_backend;

#[cfg(test)]
pub(crate) mod test_support;

pub use traits::*;
pub use types::*;
