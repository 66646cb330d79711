//! Per-instance records, the CPU/GPU instance buffer, and the sprite
//! population simulation

mod buffer;
mod population;
mod record;

pub use buffer::*;
pub use population::*;
pub use record::*;
