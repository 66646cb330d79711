//! Instanced rendering demos
//!
//! A small library plus a set of demo programs that each draw many copies
//! of the same geometry two ways: one instanced draw submission per mesh
//! part, or one submission per instance, toggled at runtime to compare the
//! paths. The pieces:
//!
//! - [`instance`]: per-instance records, the fixed-capacity CPU/GPU
//!   instance buffer, and the growing sprite population
//! - [`renderer`]: the two draw paths with per-frame submission counting,
//!   plus the immediate-mode sprite batch with its 8192-quad flush boundary
//! - [`scene`]: camera state and the free-look fly controller
//! - [`backend`]: graphics device abstraction with a wgpu implementation
//! - [`demo`]: the shared window/input/overlay harness driving each program
//!
//! Demo programs live under `demos/` and run as Cargo examples:
//!
//! ```text
//! cargo run --example asteroids
//! cargo run --example bunnymark
//! cargo run --example particles
//! cargo run --example shapes
//! ```

pub mod backend;
pub mod demo;
pub mod instance;
pub mod overlay;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use backend::wgpu_backend::WgpuBackend;
pub use backend::{BackendError, BackendResult, GraphicsBackend};
pub use demo::{Demo, DemoConfig, DemoInput};
pub use instance::{
    Bounds, ColorPolicy, InstanceBuffer, InstanceError, InstanceRecord, LifetimePolicy,
    SpriteInstance, SpritePopulation, TransformInstance, VelocityPolicy,
};
pub use renderer::{
    DepthTarget, DrawMode, DrawStats, GpuMesh, InstancedRenderer, MeshPipeline, Model,
    SpriteBatch, SpritePipelines, MAX_BATCH_QUADS,
};
pub use scene::{Camera, CameraInput, FreeLookCamera, Projection};
